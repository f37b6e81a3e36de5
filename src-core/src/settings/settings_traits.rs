use async_trait::async_trait;

use crate::errors::Result;
use crate::settings::settings_model::{Settings, SettingsUpdate};

#[async_trait]
pub trait SettingsRepositoryTrait: Send + Sync {
    fn get_all(&self) -> Result<std::collections::HashMap<String, String>>;
    async fn set_many(&self, pairs: Vec<(&'static str, String)>) -> Result<()>;
}

#[async_trait]
pub trait SettingsServiceTrait: Send + Sync {
    fn get_settings(&self) -> Result<Settings>;
    async fn update_settings(&self, update: SettingsUpdate) -> Result<Settings>;
}
