use async_trait::async_trait;

use crate::errors::Result;
use crate::import::import_model::{ImportRun, RunStatus, RunSummary};

#[async_trait]
pub trait ImportRunRepositoryTrait: Send + Sync {
    async fn start_run(&self, user_id: &str) -> Result<ImportRun>;
    async fn complete_run(
        &self,
        run_id: &str,
        status: RunStatus,
        imported: i32,
        skipped: i32,
        last_message_id: Option<String>,
    ) -> Result<()>;
    fn list_runs_for_user(&self, user_id: &str, limit: i64) -> Result<Vec<ImportRun>>;
}

#[async_trait]
pub trait ImportServiceTrait: Send + Sync {
    /// The parameterless "run sync now" entry point used by both the
    /// scheduler and the manual trigger.
    async fn run_sync(&self) -> Result<RunSummary>;
}
