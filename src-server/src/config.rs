use std::{net::SocketAddr, time::Duration};

pub struct Config {
    pub listen_addr: SocketAddr,
    pub data_dir: String,
    pub request_timeout: Duration,
    pub sync_enabled: bool,
    pub sync_interval: Duration,
    pub sync_initial_delay: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = std::env::var("IL_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .expect("Invalid IL_LISTEN_ADDR");
        let data_dir = std::env::var("IL_DATA_DIR").unwrap_or_else(|_| "./data".into());
        let timeout_ms: u64 = std::env::var("IL_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "300000".into())
            .parse()
            .unwrap_or(300_000);
        let sync_enabled = std::env::var("IL_SYNC_ENABLED")
            .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
            .unwrap_or(true);
        let sync_interval_minutes: u64 = std::env::var("IL_SYNC_INTERVAL_MINUTES")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .unwrap_or(30);
        let sync_initial_delay_secs: u64 = std::env::var("IL_SYNC_INITIAL_DELAY_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .unwrap_or(60);

        Self {
            listen_addr,
            data_dir,
            request_timeout: Duration::from_millis(timeout_ms),
            sync_enabled,
            sync_interval: Duration::from_secs(sync_interval_minutes * 60),
            sync_initial_delay: Duration::from_secs(sync_initial_delay_secs),
        }
    }
}
