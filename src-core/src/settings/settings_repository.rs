use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::Result;
use crate::schema::app_settings;
use crate::settings::settings_model::SettingRow;
use crate::settings::settings_traits::SettingsRepositoryTrait;

pub struct SettingsRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SettingsRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        SettingsRepository { pool, writer }
    }
}

#[async_trait]
impl SettingsRepositoryTrait for SettingsRepository {
    fn get_all(&self) -> Result<HashMap<String, String>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = app_settings::table.load::<SettingRow>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(|row| (row.setting_key, row.setting_value))
            .collect())
    }

    async fn set_many(&self, pairs: Vec<(&'static str, String)>) -> Result<()> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                for (key, value) in pairs {
                    let row = SettingRow {
                        setting_key: key.to_string(),
                        setting_value: value,
                    };
                    diesel::insert_into(app_settings::table)
                        .values(&row)
                        .on_conflict(app_settings::setting_key)
                        .do_update()
                        .set(app_settings::setting_value.eq(&row.setting_value))
                        .execute(conn)?;
                }
                Ok(())
            })
            .await
    }
}
