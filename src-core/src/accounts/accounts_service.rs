use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use crate::accounts::accounts_model::{Account, AccountUpdate, NewAccount};
use crate::accounts::accounts_traits::{AccountRepositoryTrait, AccountServiceTrait};
use crate::errors::Result;

/// Service for managing accounts
pub struct AccountService {
    repository: Arc<dyn AccountRepositoryTrait>,
}

impl AccountService {
    pub fn new(repository: Arc<dyn AccountRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl AccountServiceTrait for AccountService {
    fn get_account(&self, account_id: &str) -> Result<Account> {
        self.repository.get_by_id(account_id)
    }

    fn get_all_accounts(&self) -> Result<Vec<Account>> {
        self.repository.list(None)
    }

    fn get_active_accounts(&self) -> Result<Vec<Account>> {
        self.repository.list(Some(true))
    }

    async fn create_account(&self, mut new_account: NewAccount) -> Result<Account> {
        new_account.validate()?;
        debug!("Creating account '{}'", new_account.name);
        self.repository.create(new_account).await
    }

    async fn update_account(&self, mut account_update: AccountUpdate) -> Result<Account> {
        account_update.validate()?;
        self.repository.update(account_update).await
    }

    async fn delete_account(&self, account_id: &str) -> Result<usize> {
        self.repository.delete(account_id).await
    }
}
