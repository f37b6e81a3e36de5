use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use crate::errors::{Error, Result};
use crate::flags::{Flag, NewFlag};
use crate::transactions::transactions_model::{NewTransaction, Transaction, TransactionUpdate};
use crate::transactions::transactions_traits::{
    TransactionRepositoryTrait, TransactionServiceTrait,
};
use crate::transactions::TransactionError;

/// Service for transaction lifecycle.
///
/// Every mutation routes through the repository's atomic
/// persist-and-recalculate jobs, so manual entry and automated import
/// maintain the aggregates identically.
pub struct TransactionService {
    repository: Arc<dyn TransactionRepositoryTrait>,
}

impl TransactionService {
    pub fn new(repository: Arc<dyn TransactionRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl TransactionServiceTrait for TransactionService {
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        self.repository.get_by_id(transaction_id)
    }

    fn get_transactions(&self) -> Result<Vec<Transaction>> {
        self.repository.list_all()
    }

    fn get_transactions_by_account(&self, account_id: &str) -> Result<Vec<Transaction>> {
        self.repository.list_by_account(account_id)
    }

    fn get_flags(&self, transaction_id: &str) -> Result<Vec<Flag>> {
        self.repository.get_flags(transaction_id)
    }

    fn find_by_original_email_id(&self, email_id: &str) -> Result<Option<Transaction>> {
        self.repository.find_by_original_email_id(email_id)
    }

    fn suggest_category_for_payee(&self, payee: &str) -> Result<Option<String>> {
        self.repository.latest_category_for_payee(payee)
    }

    async fn create_transaction(&self, new_transaction: NewTransaction) -> Result<Transaction> {
        new_transaction.validate()?;
        self.repository
            .create_with_flags(new_transaction, Vec::new())
            .await
    }

    async fn create_imported(
        &self,
        new_transaction: NewTransaction,
        flags: Vec<NewFlag>,
    ) -> Result<Transaction> {
        new_transaction.validate()?;
        if new_transaction.original_email_id.is_none() {
            return Err(Error::Transaction(TransactionError::InvalidData(
                "Imported transactions require a source email id".to_string(),
            )));
        }
        debug!(
            "Persisting imported transaction for '{}' with {} flag(s)",
            new_transaction.payee,
            flags.len()
        );
        self.repository
            .create_with_flags(new_transaction, flags)
            .await
    }

    async fn update_transaction(
        &self,
        transaction_update: TransactionUpdate,
    ) -> Result<Transaction> {
        transaction_update.validate()?;
        self.repository.update(transaction_update).await
    }

    async fn delete_transaction(&self, transaction_id: &str) -> Result<()> {
        self.repository.delete(transaction_id).await
    }

    async fn resolve_flag(&self, flag_id: &str) -> Result<Flag> {
        self.repository.resolve_flag(flag_id).await
    }
}
