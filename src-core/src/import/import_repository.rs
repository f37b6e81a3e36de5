use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::Result;
use crate::import::import_model::{ImportRun, RunStatus};
use crate::import::import_traits::ImportRunRepositoryTrait;
use crate::schema::import_runs;

pub struct ImportRunRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ImportRunRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        ImportRunRepository { pool, writer }
    }
}

#[async_trait]
impl ImportRunRepositoryTrait for ImportRunRepository {
    async fn start_run(&self, user_id: &str) -> Result<ImportRun> {
        let user_owned = user_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<ImportRun> {
                let run = ImportRun {
                    id: Uuid::new_v4().to_string(),
                    user_id: user_owned,
                    started_at: Utc::now().to_rfc3339(),
                    completed_at: None,
                    status: RunStatus::Running.as_str().to_string(),
                    imported_count: 0,
                    skipped_count: 0,
                    last_message_id: None,
                };

                diesel::insert_into(import_runs::table)
                    .values(&run)
                    .execute(conn)?;

                Ok(run)
            })
            .await
    }

    async fn complete_run(
        &self,
        run_id: &str,
        status: RunStatus,
        imported: i32,
        skipped: i32,
        last_message_id: Option<String>,
    ) -> Result<()> {
        let id_owned = run_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::update(import_runs::table.find(&id_owned))
                    .set((
                        import_runs::completed_at.eq(Some(Utc::now().to_rfc3339())),
                        import_runs::status.eq(status.as_str()),
                        import_runs::imported_count.eq(imported),
                        import_runs::skipped_count.eq(skipped),
                        import_runs::last_message_id.eq(last_message_id),
                    ))
                    .execute(conn)?;
                Ok(())
            })
            .await
    }

    fn list_runs_for_user(&self, user_id: &str, limit: i64) -> Result<Vec<ImportRun>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(import_runs::table
            .filter(import_runs::user_id.eq(user_id))
            .order(import_runs::started_at.desc())
            .limit(limit)
            .load::<ImportRun>(&mut conn)?)
    }
}
