//! Strip I/O thread
//!
//! Frame transmission blocks for ~5 ms with strict microsecond pulse
//! widths, so exactly one thread owns the strip. Color commands arrive on a
//! small bounded channel and are drained latest-wins: if the socket thread
//! gets ahead, intermediate colors are skipped rather than queued, and the
//! strip always shows the freshest value.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use flume::{Receiver, Sender};

use crate::bus::LedBus;
use crate::strip::LedStrip;

/// A target color for the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorCommand {
    pub red: i32,
    pub green: i32,
    pub blue: i32,
}

/// Handle to the strip-owning thread.
///
/// Dropping the handle signals shutdown and joins; the thread forces the
/// strip dark before releasing the bus.
pub struct StripThread {
    command_tx: Sender<ColorCommand>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StripThread {
    /// Spawn the owning thread for an already-initialized strip.
    pub fn spawn<B: LedBus + Send + 'static>(strip: LedStrip<B>) -> Self {
        let (tx, rx) = flume::bounded::<ColorCommand>(2);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = shutdown.clone();

        let handle = std::thread::Builder::new()
            .name("led-strip".into())
            .spawn(move || {
                Self::run(strip, rx, shutdown_flag);
            })
            .expect("Failed to spawn LED strip thread");

        Self {
            command_tx: tx,
            shutdown,
            handle: Some(handle),
        }
    }

    fn run<B: LedBus>(mut strip: LedStrip<B>, rx: Receiver<ColorCommand>, shutdown: Arc<AtomicBool>) {
        log::info!("LED strip thread started");

        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            match rx.recv_timeout(Duration::from_millis(100)) {
                Ok(cmd) => {
                    // Drain queued commands, display only the latest
                    let mut latest = cmd;
                    while let Ok(newer) = rx.try_recv() {
                        latest = newer;
                    }
                    strip.set_color(latest.red, latest.green, latest.blue);
                }
                Err(flume::RecvTimeoutError::Timeout) => continue,
                Err(flume::RecvTimeoutError::Disconnected) => break,
            }
        }

        strip.off();
        log::info!("LED strip thread stopped, strip dark");
    }

    /// Queue a color (non-blocking; superseded commands are dropped).
    pub fn set_color(&self, cmd: ColorCommand) {
        let _ = self.command_tx.try_send(cmd);
    }
}

impl Drop for StripThread {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            log::debug!("Waiting for LED strip thread to stop...");
            let _ = handle.join();
        }
    }
}
