use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{Error, Result};
use crate::flags::flags_model::{Flag, FlagDB, NewFlag};
use crate::ledger;
use crate::schema::{transaction_flags, transactions};
use crate::transactions::transactions_model::{
    NewTransaction, Transaction, TransactionDB, TransactionUpdate,
};
use crate::transactions::transactions_traits::TransactionRepositoryTrait;
use crate::transactions::TransactionError;

pub struct TransactionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl TransactionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        TransactionRepository { pool, writer }
    }
}

fn load_transaction(conn: &mut SqliteConnection, transaction_id: &str) -> Result<Transaction> {
    let row = transactions::table
        .find(transaction_id)
        .first::<TransactionDB>(conn)
        .optional()?
        .ok_or_else(|| {
            Error::Transaction(TransactionError::NotFound(transaction_id.to_string()))
        })?;
    row.try_into()
}

/// Recalculates the aggregates a mutation touched. Old and new
/// category/account are both rewritten when they differ, once when they
/// are the same.
fn recalculate_touched(
    conn: &mut SqliteConnection,
    old_category: Option<&str>,
    new_category: Option<&str>,
    old_account: Option<&str>,
    new_account: Option<&str>,
) -> Result<()> {
    if let Some(category_id) = old_category {
        ledger::recalculate_category(conn, category_id)?;
    }
    if let Some(category_id) = new_category {
        if old_category != Some(category_id) {
            ledger::recalculate_category(conn, category_id)?;
        }
    }
    if let Some(account_id) = old_account {
        ledger::recalculate_account(conn, account_id)?;
    }
    if let Some(account_id) = new_account {
        if old_account != Some(account_id) {
            ledger::recalculate_account(conn, account_id)?;
        }
    }
    Ok(())
}

fn insert_flags(
    conn: &mut SqliteConnection,
    transaction_id: &str,
    flags: Vec<NewFlag>,
) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    for flag in flags {
        let row = FlagDB {
            id: Uuid::new_v4().to_string(),
            transaction_id: transaction_id.to_string(),
            reason: flag.reason.as_str().to_string(),
            message: flag.message,
            created_at: now.clone(),
            resolved: false,
        };
        diesel::insert_into(transaction_flags::table)
            .values(&row)
            .execute(conn)?;
    }
    Ok(())
}

#[async_trait]
impl TransactionRepositoryTrait for TransactionRepository {
    fn get_by_id(&self, transaction_id: &str) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)?;
        load_transaction(&mut conn, transaction_id)
    }

    fn list_all(&self) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = transactions::table
            .order((
                transactions::transaction_date.desc(),
                transactions::created_at.desc(),
            ))
            .load::<TransactionDB>(&mut conn)?;
        rows.into_iter().map(Transaction::try_from).collect()
    }

    fn list_by_account(&self, account_id: &str) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = transactions::table
            .filter(transactions::account_id.eq(account_id))
            .order((
                transactions::transaction_date.desc(),
                transactions::created_at.desc(),
            ))
            .load::<TransactionDB>(&mut conn)?;
        rows.into_iter().map(Transaction::try_from).collect()
    }

    fn find_by_original_email_id(&self, email_id: &str) -> Result<Option<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let row = transactions::table
            .filter(transactions::original_email_id.eq(email_id))
            .first::<TransactionDB>(&mut conn)
            .optional()?;
        row.map(Transaction::try_from).transpose()
    }

    fn latest_category_for_payee(&self, payee: &str) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        let category: Option<Option<String>> = transactions::table
            .filter(transactions::payee.eq(payee))
            .filter(transactions::category_id.is_not_null())
            .order(transactions::created_at.desc())
            .select(transactions::category_id)
            .first(&mut conn)
            .optional()?;
        Ok(category.flatten())
    }

    fn get_flags(&self, transaction_id: &str) -> Result<Vec<Flag>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = transaction_flags::table
            .filter(transaction_flags::transaction_id.eq(transaction_id))
            .order(transaction_flags::created_at.asc())
            .load::<FlagDB>(&mut conn)?;
        rows.into_iter().map(Flag::try_from).collect()
    }

    async fn create_with_flags(
        &self,
        new_transaction: NewTransaction,
        flags: Vec<NewFlag>,
    ) -> Result<Transaction> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Transaction> {
                // Dedup re-check inside the transaction: the coordinator
                // already checked, but a concurrent run may have persisted
                // the same message in between.
                if let Some(email_id) = new_transaction.original_email_id.as_deref() {
                    let existing: i64 = transactions::table
                        .filter(transactions::original_email_id.eq(email_id))
                        .count()
                        .get_result(conn)?;
                    if existing > 0 {
                        return Err(Error::Transaction(TransactionError::Duplicate(
                            email_id.to_string(),
                        )));
                    }
                }

                let mut row: TransactionDB = new_transaction.into();
                if row.id.is_empty() {
                    row.id = Uuid::new_v4().to_string();
                }

                diesel::insert_into(transactions::table)
                    .values(&row)
                    .execute(conn)?;

                insert_flags(conn, &row.id, flags)?;

                recalculate_touched(
                    conn,
                    None,
                    row.category_id.as_deref(),
                    None,
                    Some(&row.account_id),
                )?;

                load_transaction(conn, &row.id)
            })
            .await
    }

    async fn update(&self, transaction_update: TransactionUpdate) -> Result<Transaction> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Transaction> {
                let old = load_transaction(conn, &transaction_update.id)?;

                let now = Utc::now().to_rfc3339();
                diesel::update(transactions::table.find(&transaction_update.id))
                    .set((
                        transactions::transaction_date.eq(transaction_update
                            .transaction_date
                            .format(crate::transactions::transactions_model::DATE_FORMAT)
                            .to_string()),
                        transactions::payee.eq(&transaction_update.payee),
                        transactions::amount.eq(transaction_update.amount),
                        transactions::category_id.eq(&transaction_update.category_id),
                        transactions::account_id.eq(&transaction_update.account_id),
                        transactions::status.eq(transaction_update.status.as_str()),
                        transactions::notes.eq(&transaction_update.notes),
                        transactions::updated_at.eq(&now),
                    ))
                    .execute(conn)?;

                recalculate_touched(
                    conn,
                    old.category_id.as_deref(),
                    transaction_update.category_id.as_deref(),
                    Some(&old.account_id),
                    Some(&transaction_update.account_id),
                )?;

                load_transaction(conn, &transaction_update.id)
            })
            .await
    }

    async fn delete(&self, transaction_id: &str) -> Result<()> {
        let id_owned = transaction_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let old = load_transaction(conn, &id_owned)?;

                diesel::delete(transactions::table.find(&id_owned)).execute(conn)?;

                recalculate_touched(
                    conn,
                    old.category_id.as_deref(),
                    None,
                    Some(&old.account_id),
                    None,
                )?;

                Ok(())
            })
            .await
    }

    async fn resolve_flag(&self, flag_id: &str) -> Result<Flag> {
        let id_owned = flag_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Flag> {
                let updated = diesel::update(transaction_flags::table.find(&id_owned))
                    .set(transaction_flags::resolved.eq(true))
                    .execute(conn)?;
                if updated == 0 {
                    return Err(Error::Transaction(TransactionError::FlagNotFound(
                        id_owned.clone(),
                    )));
                }

                let row = transaction_flags::table
                    .find(&id_owned)
                    .first::<FlagDB>(conn)?;
                row.try_into()
            })
            .await
    }
}
