//! TrustLock Security Dashboard - Entry Point
//!
//! Loads configuration from the environment, seeds the in-memory store
//! from an optional JSON file, bootstraps an admin account when one is
//! configured, and serves the dashboard until shutdown.

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use trustlock::store::MemoryStore;
use trustlock::{Role, ServerConfig, TrustLockServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("TrustLock v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::from_env();

    let store = match &config.seed_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            let root: serde_json::Value = serde_json::from_str(&raw)?;
            info!(path = %path, "seeding store from file");
            MemoryStore::with_root(root)
        }
        None => MemoryStore::new(),
    };

    let server = TrustLockServer::new(config, Arc::new(store)).await?;

    if let (Ok(email), Ok(password)) = (
        std::env::var("TRUSTLOCK_ADMIN_EMAIL"),
        std::env::var("TRUSTLOCK_ADMIN_PASSWORD"),
    ) {
        match server.auth().register(&email, "Administrator", &password, Role::Admin) {
            Ok(account) => info!(email = %account.email, "bootstrapped admin account"),
            Err(err) => warn!(error = %err, "admin bootstrap failed"),
        }
    }

    server.run().await.map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}
