pub mod api;
pub mod config;
pub mod error;
pub mod scheduler;

use std::sync::Arc;

use inboxledger_core::ServiceContext;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

pub struct AppState {
    pub ctx: ServiceContext,
}

pub type SharedState = Arc<AppState>;

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,inboxledger_server=debug".into()),
        )
        .init();
}

pub async fn build_state(config: &Config) -> anyhow::Result<SharedState> {
    let ctx = ServiceContext::new(&config.data_dir)?;
    Ok(Arc::new(AppState { ctx }))
}
