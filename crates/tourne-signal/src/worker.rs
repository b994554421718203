//! Pipeline worker thread
//!
//! Owns all channel state. The socket thread sends decoded messages over a
//! bounded channel; the worker feeds them through the pipeline and publishes
//! the results back to the router. Because one thread owns the state, a
//! channel's update sequence is serialized without locks.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use flume::{Receiver, Sender};
use tourne_core::message::Message;
use tourne_core::wire;

use crate::pipeline::Pipeline;

/// Handle to the running pipeline worker.
pub struct PipelineWorker {
    sample_tx: Sender<Message>,
    _thread: JoinHandle<()>,
}

impl PipelineWorker {
    /// Spawn the worker, publishing conditioned values to `router_addr`.
    pub fn spawn(pipeline: Pipeline, router_addr: &str) -> Result<Self> {
        let router_addr: SocketAddr = router_addr
            .to_socket_addrs()
            .with_context(|| format!("Cannot resolve router address {}", router_addr))?
            .next()
            .context("No address for router")?;
        let socket = UdpSocket::bind("0.0.0.0:0").context("Cannot bind publisher socket")?;

        let (tx, rx) = flume::bounded::<Message>(64);

        let thread = std::thread::Builder::new()
            .name("signal-pipeline".into())
            .spawn(move || {
                Self::run(pipeline, rx, socket, router_addr);
            })
            .context("Failed to spawn pipeline worker thread")?;

        Ok(Self {
            sample_tx: tx,
            _thread: thread,
        })
    }

    fn run(mut pipeline: Pipeline, rx: Receiver<Message>, socket: UdpSocket, router: SocketAddr) {
        log::info!("Pipeline worker started, publishing to {}", router);

        loop {
            match rx.recv_timeout(Duration::from_secs(1)) {
                Ok(msg) => {
                    for out in pipeline.handle(&msg) {
                        let payload = wire::encode(&out);
                        if let Err(e) = socket.send_to(&payload, router) {
                            log::warn!("Publish of {} failed: {}", out.topic, e);
                        }
                    }
                }
                Err(flume::RecvTimeoutError::Disconnected) => {
                    log::info!("Pipeline worker: channel disconnected, shutting down");
                    break;
                }
                Err(flume::RecvTimeoutError::Timeout) => {
                    // No samples within a second; the camera may be down.
                    continue;
                }
            }
        }
    }

    /// Hand a decoded sample to the worker (non-blocking, drops if full).
    ///
    /// Dropping under backlog is deliberate: a late color sample is worse
    /// than a missing one, and the EMA absorbs gaps anyway.
    pub fn send(&self, msg: Message) {
        if self.sample_tx.try_send(msg).is_err() {
            log::warn!("Pipeline worker behind, dropping sample");
        }
    }
}
