//! tourne-router daemon entry point
//!
//! Loads the network config (fatal if missing or malformed: a router
//! without a routing table would misroute the whole installation), binds
//! the inbound socket, and serves forever.

use anyhow::Result;
use tourne_core::config;
use tourne_router::Router;

fn main() -> Result<()> {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(config::default_config_path);

    log::info!("tourne-router starting (config: {:?})", config_path);

    let config = config::load_config(&config_path)?;
    let router = Router::new(&config)?;
    router.serve()
}
