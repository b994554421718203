//! Shared building blocks for the tourne installation
//!
//! This crate provides:
//! - The topic-addressed message model exchanged between daemons
//! - The UDP wire codec (an OSC 1.0 subset, so Pure Data patches can
//!   subscribe directly)
//! - Ring-buffer mean + EMA smoothing primitives used by both the
//!   conditioning pipeline and the LED driver
//! - The shared network configuration schema
//! - Data shapes for the motor controller's line-text serial protocol
//!
//! # Architecture
//!
//! ```text
//! camera daemon → router → tourne-signal → router → {tourne-led, Pure Data, music}
//! ```
//!
//! Every daemon talks UDP to the central router; the router fans messages
//! out according to its routing table. Delivery is fire-and-forget.

pub mod config;
pub mod message;
pub mod motor;
pub mod smoothing;
pub mod wire;

pub use config::{default_config_path, load_config, Destination, ListenConfig, NetworkConfig, RouteRule};
pub use message::{Arg, Message};
pub use motor::{parse_status_line, MotorCommand, StatusEvent};
pub use smoothing::{Ema, RingBuffer, SmoothedChannel};
pub use wire::{decode, encode, WireError};
