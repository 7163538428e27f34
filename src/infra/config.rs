use env_helpers::{get_env, get_env_default};

pub const DEFAULT_BILLING_QUEUE_KEY: &str = "planshift:jobs:bill_subscription";
pub const DEFAULT_TRACKING_QUEUE_KEY: &str = "planshift:jobs:segment_track";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: String,
    /// Redis list that billing workers consume `bill_subscription` jobs from.
    pub billing_queue_key: String,
    /// Redis list that tracking workers consume `segment_track` jobs from.
    pub tracking_queue_key: String,
    /// JSON log output in addition to the console, when set.
    pub log_file: Option<String>,
    pub run_migrations: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url: String = get_env("DATABASE_URL");
        let database_max_connections: u32 = get_env_default("DATABASE_MAX_CONNECTIONS", 5);
        let redis_url: String = get_env_default("REDIS_URL", "redis://127.0.0.1:6379".to_string());
        let billing_queue_key: String =
            get_env_default("BILLING_QUEUE_KEY", DEFAULT_BILLING_QUEUE_KEY.to_string());
        let tracking_queue_key: String =
            get_env_default("TRACKING_QUEUE_KEY", DEFAULT_TRACKING_QUEUE_KEY.to_string());
        let log_file: Option<String> = std::env::var("LOG_FILE")
            .ok()
            .filter(|path| !path.trim().is_empty());
        let run_migrations: bool = get_env_default("RUN_MIGRATIONS", true);

        Self {
            database_url,
            database_max_connections,
            redis_url,
            billing_queue_key,
            tracking_queue_key,
            log_file,
            run_migrations,
        }
    }
}
