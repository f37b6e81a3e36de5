use async_trait::async_trait;

use crate::accounts::accounts_model::{Account, AccountUpdate, NewAccount};
use crate::errors::Result;

#[async_trait]
pub trait AccountRepositoryTrait: Send + Sync {
    fn get_by_id(&self, account_id: &str) -> Result<Account>;
    fn list(&self, is_active_filter: Option<bool>) -> Result<Vec<Account>>;
    async fn create(&self, new_account: NewAccount) -> Result<Account>;
    async fn update(&self, account_update: AccountUpdate) -> Result<Account>;
    async fn delete(&self, account_id: &str) -> Result<usize>;
}

#[async_trait]
pub trait AccountServiceTrait: Send + Sync {
    fn get_account(&self, account_id: &str) -> Result<Account>;
    fn get_all_accounts(&self) -> Result<Vec<Account>>;
    fn get_active_accounts(&self) -> Result<Vec<Account>>;
    async fn create_account(&self, new_account: NewAccount) -> Result<Account>;
    async fn update_account(&self, account_update: AccountUpdate) -> Result<Account>;
    async fn delete_account(&self, account_id: &str) -> Result<usize>;
}
