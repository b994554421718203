//! Signal conditioning pipeline
//!
//! Converts the camera's noisy 10 Hz color samples into stable actuation
//! values: each channel runs through a ring-buffer mean and a very slow EMA
//! (multiple seconds of integration), and the results are republished
//! through the router for the LED driver, Pure Data, and the music engine.
//!
//! # Architecture
//!
//! ```text
//! UDP socket thread → flume channel → pipeline worker → UDP publisher
//! ```
//!
//! The socket thread only decodes datagrams; all channel state lives on the
//! worker thread, so per-channel updates are serialized by ownership rather
//! than locks.

mod pipeline;
mod worker;

pub use pipeline::{Pipeline, RAW_HSV_TOPIC, RAW_RGB_TOPIC};
pub use worker::PipelineWorker;
