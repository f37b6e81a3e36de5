use async_trait::async_trait;

use crate::errors::Result;
use crate::flags::{Flag, NewFlag};
use crate::transactions::transactions_model::{NewTransaction, Transaction, TransactionUpdate};

#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    fn get_by_id(&self, transaction_id: &str) -> Result<Transaction>;
    fn list_all(&self) -> Result<Vec<Transaction>>;
    fn list_by_account(&self, account_id: &str) -> Result<Vec<Transaction>>;
    /// Dedup lookup by source message id.
    fn find_by_original_email_id(&self, email_id: &str) -> Result<Option<Transaction>>;
    /// Category of the most recent categorized transaction with this payee.
    fn latest_category_for_payee(&self, payee: &str) -> Result<Option<String>>;
    fn get_flags(&self, transaction_id: &str) -> Result<Vec<Flag>>;

    /// Inserts the transaction plus its flags and rewrites the affected
    /// aggregates, all inside one write-actor job (one SQLite
    /// transaction). Re-checks the dedup key inside that transaction.
    async fn create_with_flags(
        &self,
        new_transaction: NewTransaction,
        flags: Vec<NewFlag>,
    ) -> Result<Transaction>;

    /// Updates and recalculates every touched aggregate: the previous and
    /// the new category/account when either changed.
    async fn update(&self, transaction_update: TransactionUpdate) -> Result<Transaction>;

    async fn delete(&self, transaction_id: &str) -> Result<()>;

    /// Marks a flag resolved. Flags are never deleted.
    async fn resolve_flag(&self, flag_id: &str) -> Result<Flag>;
}

#[async_trait]
pub trait TransactionServiceTrait: Send + Sync {
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction>;
    fn get_transactions(&self) -> Result<Vec<Transaction>>;
    fn get_transactions_by_account(&self, account_id: &str) -> Result<Vec<Transaction>>;
    fn get_flags(&self, transaction_id: &str) -> Result<Vec<Flag>>;
    fn find_by_original_email_id(&self, email_id: &str) -> Result<Option<Transaction>>;
    fn suggest_category_for_payee(&self, payee: &str) -> Result<Option<String>>;

    async fn create_transaction(&self, new_transaction: NewTransaction) -> Result<Transaction>;

    /// Import path: persists the candidate with its review flags as one
    /// atomic unit.
    async fn create_imported(
        &self,
        new_transaction: NewTransaction,
        flags: Vec<NewFlag>,
    ) -> Result<Transaction>;

    async fn update_transaction(
        &self,
        transaction_update: TransactionUpdate,
    ) -> Result<Transaction>;

    async fn delete_transaction(&self, transaction_id: &str) -> Result<()>;

    async fn resolve_flag(&self, flag_id: &str) -> Result<Flag>;
}
