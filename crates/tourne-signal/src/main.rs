//! tourne-signal daemon entry point
//!
//! Binds the conditioning pipeline's inbound socket, decodes raw samples,
//! and hands them to the worker thread. Runs with defaults if the config
//! file is absent; the pipeline is useful standalone on a bench.

use std::net::UdpSocket;

use anyhow::{Context, Result};
use tourne_core::{config, wire};
use tourne_signal::{Pipeline, PipelineWorker};

fn main() -> Result<()> {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(config::default_config_path);
    let config = config::load_config_or_default(&config_path);

    log::info!(
        "tourne-signal starting (alpha={}, buffer={}, listen={})",
        config.signal.alpha,
        config.signal.buffer_size,
        config.signal.listen.addr()
    );

    let pipeline = Pipeline::new(config.signal.alpha, config.signal.buffer_size);
    let worker = PipelineWorker::spawn(pipeline, &config.router.addr())?;

    let socket = UdpSocket::bind(config.signal.listen.addr())
        .with_context(|| format!("Cannot bind on {}", config.signal.listen.addr()))?;

    let mut buf = [0u8; 1536];
    loop {
        let (len, src) = socket
            .recv_from(&mut buf)
            .context("Sample socket receive failed")?;
        match wire::decode(&buf[..len]) {
            Ok(msg) => worker.send(msg),
            Err(e) => log::warn!("Dropping malformed datagram from {}: {}", src, e),
        }
    }
}
