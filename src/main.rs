//! ledgerd entry point.
//!
//! Boot order: arguments, config, logging, storage backend, orchestrator,
//! gateway.

use std::sync::Arc;
use std::time::Duration;

use ledgerd::config::AppConfig;
use ledgerd::gateway::{self, state::AppState};
use ledgerd::ledger::{Ledger, LedgerStore, MemoryLedgerStore, PgLedgerStore, RetryPolicy};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);
    let _log_guard = ledgerd::logging::init_logging(&config);

    tracing::info!("Starting ledgerd in {} mode", env);

    let store: Arc<dyn LedgerStore> = match config.storage.backend.as_str() {
        "postgres" => {
            let url = config.storage.postgres_url.as_deref().ok_or_else(|| {
                anyhow::anyhow!("storage.postgres_url is required for the postgres backend")
            })?;
            let store = PgLedgerStore::connect(url, config.storage.max_connections).await?;
            store.health_check().await?;
            Arc::new(store)
        }
        "memory" => {
            tracing::warn!("memory storage backend selected; state is volatile");
            Arc::new(MemoryLedgerStore::new())
        }
        other => anyhow::bail!("unknown storage backend: {}", other),
    };

    let retry = RetryPolicy::new(
        config.transfer.max_attempts,
        Duration::from_millis(config.transfer.retry_pause_ms),
    );
    let ledger = Arc::new(Ledger::new(store, retry));

    let state = Arc::new(AppState::new(
        ledger,
        Duration::from_millis(config.transfer.request_timeout_ms),
    ));

    let port = get_port_override().unwrap_or(config.gateway.port);
    gateway::serve(state, &config.gateway.host, port).await?;

    Ok(())
}
