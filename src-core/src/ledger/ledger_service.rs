use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::info;

use crate::db::WriteHandle;
use crate::errors::Result;
use crate::ledger::ledger_recalculator::{recalculate_account, recalculate_category};
use crate::ledger::ledger_traits::LedgerServiceTrait;
use crate::schema::{accounts, categories};

/// Explicit recalculation entry point. The transaction repository already
/// recalculates inline with every mutation; this service exists for
/// consistency repair and startup checks.
pub struct LedgerService {
    writer: WriteHandle,
}

impl LedgerService {
    pub fn new(writer: WriteHandle) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl LedgerServiceTrait for LedgerService {
    async fn recalculate_category(&self, category_id: &str) -> Result<()> {
        let id_owned = category_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| recalculate_category(conn, &id_owned))
            .await
    }

    async fn recalculate_account(&self, account_id: &str) -> Result<()> {
        let id_owned = account_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| recalculate_account(conn, &id_owned))
            .await
    }

    async fn recalculate_all(&self) -> Result<()> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let category_ids: Vec<String> =
                    categories::table.select(categories::id).load(conn)?;
                let account_ids: Vec<String> = accounts::table.select(accounts::id).load(conn)?;

                for category_id in &category_ids {
                    recalculate_category(conn, category_id)?;
                }
                for account_id in &account_ids {
                    recalculate_account(conn, account_id)?;
                }

                info!(
                    "Rebuilt aggregates for {} categories and {} accounts",
                    category_ids.len(),
                    account_ids.len()
                );
                Ok(())
            })
            .await
    }
}
