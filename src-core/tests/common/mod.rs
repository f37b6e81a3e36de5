use std::sync::Arc;

use inboxledger_core::accounts::{
    AccountRepository, AccountService, AccountServiceTrait, AccountType, NewAccount,
};
use inboxledger_core::categories::{
    CategoryRepository, CategoryService, CategoryServiceTrait, NewCategory,
};
use inboxledger_core::db::{self, DbPool, WriteHandle};
use inboxledger_core::transactions::{
    TransactionRepository, TransactionService, TransactionServiceTrait,
};
use tempfile::TempDir;

pub struct TestDb {
    pub pool: Arc<DbPool>,
    pub writer: WriteHandle,
    // Held so the database directory outlives the test
    _tmp: TempDir,
}

/// Builds a throwaway SQLite database through the real migrations and
/// spawns a write actor for it. Must run inside a tokio runtime.
pub fn setup_db() -> TestDb {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = db::init(tmp.path().to_str().unwrap()).unwrap();
    let pool = db::create_pool(&db_path).unwrap();
    db::run_migrations(&pool).unwrap();
    let writer = db::spawn_writer(Arc::clone(&pool));
    TestDb {
        pool,
        writer,
        _tmp: tmp,
    }
}

pub fn account_service(tdb: &TestDb) -> Arc<dyn AccountServiceTrait> {
    Arc::new(AccountService::new(Arc::new(AccountRepository::new(
        Arc::clone(&tdb.pool),
        tdb.writer.clone(),
    ))))
}

pub fn category_service(tdb: &TestDb) -> Arc<dyn CategoryServiceTrait> {
    Arc::new(CategoryService::new(Arc::new(CategoryRepository::new(
        Arc::clone(&tdb.pool),
        tdb.writer.clone(),
    ))))
}

pub fn transaction_service(tdb: &TestDb) -> Arc<dyn TransactionServiceTrait> {
    Arc::new(TransactionService::new(Arc::new(
        TransactionRepository::new(Arc::clone(&tdb.pool), tdb.writer.clone()),
    )))
}

pub async fn create_account(
    accounts: &Arc<dyn AccountServiceTrait>,
    name: &str,
    email_domain: Option<&str>,
) -> inboxledger_core::accounts::Account {
    accounts
        .create_account(NewAccount {
            id: None,
            name: name.to_string(),
            account_type: AccountType::Checking,
            email_domain: email_domain.map(str::to_string),
            is_active: true,
        })
        .await
        .unwrap()
}

pub async fn create_category(
    categories: &Arc<dyn CategoryServiceTrait>,
    name: &str,
    assigned: f64,
) -> inboxledger_core::categories::Category {
    categories
        .create_category(NewCategory {
            id: None,
            name: name.to_string(),
            group_name: "Everyday".to_string(),
            assigned,
        })
        .await
        .unwrap()
}

/// Asserts the envelope invariant for every category and the balance
/// invariant for every account.
pub fn assert_aggregates_consistent(
    categories: &Arc<dyn CategoryServiceTrait>,
    accounts: &Arc<dyn AccountServiceTrait>,
    transactions: &Arc<dyn TransactionServiceTrait>,
) {
    let all_transactions = transactions.get_transactions().unwrap();

    for category in categories.get_categories().unwrap() {
        let activity: f64 = all_transactions
            .iter()
            .filter(|t| t.category_id.as_deref() == Some(category.id.as_str()))
            .map(|t| t.amount)
            .sum();
        assert_eq!(
            category.activity, activity,
            "activity mismatch for category '{}'",
            category.name
        );
        assert_eq!(
            category.available,
            category.assigned - category.activity,
            "envelope invariant violated for category '{}'",
            category.name
        );
    }

    for account in accounts.get_all_accounts().unwrap() {
        let balance: f64 = all_transactions
            .iter()
            .filter(|t| t.account_id == account.id)
            .map(|t| t.amount)
            .sum();
        assert_eq!(
            account.cleared_balance, balance,
            "balance invariant violated for account '{}'",
            account.name
        );
    }
}
