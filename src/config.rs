use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub enable_tracing: bool,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    /// "postgres" or "memory"
    pub backend: String,
    pub postgres_url: Option<String>,
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            postgres_url: None,
            max_connections: 10,
        }
    }
}

/// Transfer orchestration knobs
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TransferConfig {
    /// Attempts per transfer before reporting contention to the caller
    pub max_attempts: u32,
    /// Pause between conflicting attempts. Anti-spin, not backoff.
    pub retry_pause_ms: u64,
    /// Caller-visible bound on one transfer request, retries included
    pub request_timeout_ms: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_pause_ms: 5,
            request_timeout_ms: 3000,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }
}
