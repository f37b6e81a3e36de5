use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::accounts::accounts_model::{Account, AccountDB, AccountUpdate, NewAccount};
use crate::accounts::accounts_traits::AccountRepositoryTrait;
use crate::accounts::AccountError;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{Error, Result};
use crate::schema::accounts;

pub struct AccountRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl AccountRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        AccountRepository { pool, writer }
    }
}

/// Rejects an email domain already claimed by a different account.
/// Runs inside the writer's transaction so concurrent creates cannot race.
fn assert_domain_unclaimed(
    conn: &mut SqliteConnection,
    domain: &str,
    exclude_id: Option<&str>,
) -> Result<()> {
    let claimed: i64 = match exclude_id {
        Some(id) => accounts::table
            .filter(accounts::email_domain.eq(domain))
            .filter(accounts::id.ne(id))
            .count()
            .get_result(conn)?,
        None => accounts::table
            .filter(accounts::email_domain.eq(domain))
            .count()
            .get_result(conn)?,
    };
    if claimed > 0 {
        return Err(Error::Account(AccountError::DuplicateEmailDomain(
            domain.to_string(),
        )));
    }
    Ok(())
}

#[async_trait]
impl AccountRepositoryTrait for AccountRepository {
    fn get_by_id(&self, account_id: &str) -> Result<Account> {
        let mut conn = get_connection(&self.pool)?;
        let row = accounts::table
            .find(account_id)
            .first::<AccountDB>(&mut conn)
            .optional()?
            .ok_or_else(|| Error::Account(AccountError::NotFound(account_id.to_string())))?;
        row.try_into()
    }

    fn list(&self, is_active_filter: Option<bool>) -> Result<Vec<Account>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = accounts::table.order(accounts::name.asc()).into_boxed();
        if let Some(is_active) = is_active_filter {
            query = query.filter(accounts::is_active.eq(is_active));
        }
        let rows = query.load::<AccountDB>(&mut conn)?;
        rows.into_iter().map(Account::try_from).collect()
    }

    async fn create(&self, new_account: NewAccount) -> Result<Account> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Account> {
                let mut account_db: AccountDB = new_account.into();
                if account_db.id.is_empty() {
                    account_db.id = Uuid::new_v4().to_string();
                }

                if let Some(domain) = account_db.email_domain.as_deref() {
                    assert_domain_unclaimed(conn, domain, None)?;
                }

                diesel::insert_into(accounts::table)
                    .values(&account_db)
                    .execute(conn)?;

                account_db.try_into()
            })
            .await
    }

    async fn update(&self, account_update: AccountUpdate) -> Result<Account> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Account> {
                let existing = accounts::table
                    .find(&account_update.id)
                    .first::<AccountDB>(conn)
                    .optional()?
                    .ok_or_else(|| {
                        Error::Account(AccountError::NotFound(account_update.id.clone()))
                    })?;

                if let Some(domain) = account_update.email_domain.as_deref() {
                    assert_domain_unclaimed(conn, domain, Some(&existing.id))?;
                }

                let now = chrono::Utc::now().to_rfc3339();
                diesel::update(accounts::table.find(&account_update.id))
                    .set((
                        accounts::name.eq(&account_update.name),
                        accounts::account_type.eq(account_update.account_type.as_str()),
                        accounts::email_domain.eq(&account_update.email_domain),
                        accounts::is_active.eq(account_update.is_active),
                        accounts::updated_at.eq(&now),
                    ))
                    .execute(conn)?;

                let row = accounts::table
                    .find(&account_update.id)
                    .first::<AccountDB>(conn)?;
                row.try_into()
            })
            .await
    }

    async fn delete(&self, account_id: &str) -> Result<usize> {
        let id_owned = account_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::delete(accounts::table.find(id_owned)).execute(conn)?)
            })
            .await
    }
}
