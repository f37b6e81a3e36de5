use async_trait::async_trait;

use crate::errors::Result;

#[async_trait]
pub trait LedgerServiceTrait: Send + Sync {
    async fn recalculate_category(&self, category_id: &str) -> Result<()>;
    async fn recalculate_account(&self, account_id: &str) -> Result<()>;
    /// Rebuilds every stored aggregate from the transaction table.
    async fn recalculate_all(&self) -> Result<()>;
}
