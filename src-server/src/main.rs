use inboxledger_server::{api::app_router, build_state, config::Config, init_tracing, scheduler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing();

    let state = build_state(&config).await?;

    if config.sync_enabled {
        scheduler::spawn_scheduler(
            state.clone(),
            config.sync_interval,
            config.sync_initial_delay,
        );
    }

    let router = app_router(state, &config);
    tracing::info!("Listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
