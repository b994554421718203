//! Strip driver: smoothing stage plus frame transmission
//!
//! `set_color` clamps each input to [0,255], runs it through the local
//! ring-buffer-mean + EMA stage, and transmits one frame. The EMA here is
//! seeded at zero — the strip starts dark and ramps up — unlike the
//! pipeline's first-sample seeding; see `tourne_core::smoothing`.
//!
//! Transmission is a blocking critical section (~5 ms); the strip must be
//! owned by a single writer (see `thread.rs`).

use tourne_core::smoothing::SmoothedChannel;

use crate::bus::LedBus;
use crate::frame::encode_frame;

/// Sync pulses bracketing each frame word.
const SYNC_PULSES: usize = 32;

/// The LED strip: owns the bus and the local smoothing state.
pub struct LedStrip<B: LedBus> {
    bus: B,
    channels: [SmoothedChannel; 3],
}

impl<B: LedBus> LedStrip<B> {
    /// Take ownership of the bus with the given local smoothing parameters.
    pub fn new(bus: B, alpha: f32, buffer_size: usize) -> Self {
        Self {
            bus,
            channels: std::array::from_fn(|_| SmoothedChannel::zero_seeded(alpha, buffer_size)),
        }
    }

    /// Smooth and display a color. Inputs are clamped to [0,255].
    pub fn set_color(&mut self, red: i32, green: i32, blue: i32) {
        let raw = [red, green, blue].map(|v| v.clamp(0, 255) as f32);
        let mut smoothed = [0u8; 3];
        for (channel, (&value, out)) in
            self.channels.iter_mut().zip(raw.iter().zip(&mut smoothed))
        {
            // Round at the encode boundary; state stays float so the EMA
            // can actually converge to full scale
            *out = channel.feed(value).round().clamp(0.0, 255.0) as u8;
        }
        self.transmit(smoothed[0], smoothed[1], smoothed[2]);
    }

    /// Force the strip dark immediately, bypassing the smoothing stage.
    /// Used on shutdown.
    pub fn off(&mut self) {
        self.transmit(0, 0, 0);
    }

    /// Send one complete frame: sync, word MSB-first, sync.
    fn transmit(&mut self, red: u8, green: u8, blue: u8) {
        self.send_sync();
        let mut word = encode_frame(red, green, blue);
        for _ in 0..32 {
            self.bus.write_data(word & 0x8000_0000 != 0);
            self.bus.pulse_clock();
            word <<= 1;
        }
        self.send_sync();
    }

    /// 32 clock pulses with the data line held low.
    fn send_sync(&mut self) {
        self.bus.write_data(false);
        for _ in 0..SYNC_PULSES {
            self.bus.pulse_clock();
        }
    }

    /// Access the bus (tests decode the recorded pulse train).
    #[cfg(test)]
    pub(crate) fn bus(&self) -> &B {
        &self.bus
    }
}
