use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::Result;
use crate::settings::settings_model::{Settings, SettingsUpdate};
use crate::settings::settings_traits::{SettingsRepositoryTrait, SettingsServiceTrait};

pub struct SettingsService {
    repository: Arc<dyn SettingsRepositoryTrait>,
}

impl SettingsService {
    pub fn new(repository: Arc<dyn SettingsRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl SettingsServiceTrait for SettingsService {
    fn get_settings(&self) -> Result<Settings> {
        let rows = self.repository.get_all()?;
        Ok(Settings::from_rows(&rows))
    }

    async fn update_settings(&self, update: SettingsUpdate) -> Result<Settings> {
        let pairs = update.into_pairs();
        if !pairs.is_empty() {
            self.repository.set_many(pairs).await?;
        }
        self.get_settings()
    }
}
