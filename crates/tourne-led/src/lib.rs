//! LED strip protocol driver
//!
//! Drives a clocked 2-wire RGB strip (Grove/P9813-style) by bit-banging two
//! GPIO lines with ~20 µs half-periods. A full update is 32 sync pulses, one
//! 32-bit frame word, and 32 more sync pulses — about 5 ms of blocking,
//! timing-sensitive transmission, so exactly one thread ever owns the bus.
//!
//! Incoming colors pass through a local ring-buffer-mean + EMA stage before
//! encoding. This stage is much faster than the upstream pipeline's; it only
//! protects the hardware from step changes if upstream smoothing is ever
//! bypassed.
//!
//! Protocol logic is written against the narrow [`LedBus`] trait so it can
//! be unit-tested against a recording fake, independent of real timing.

mod bus;
mod frame;
mod strip;
mod thread;

pub use bus::{LedBus, NullBus};
#[cfg(all(target_os = "linux", feature = "gpio"))]
pub use bus::{GpioBus, GpioError};
pub use frame::{anti_code, encode_frame};
pub use strip::LedStrip;
pub use thread::{ColorCommand, StripThread};
