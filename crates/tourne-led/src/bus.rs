//! Hardware abstraction for the strip's two digital lines
//!
//! The protocol layer only needs two operations: set the data line level and
//! emit one clock pulse. Keeping the surface this narrow makes the bit
//! sequencing unit-testable with a recording fake while the real
//! implementation owns the GPIO pins and the microsecond timing.

/// The strip's 2-wire bus: one data line, one clock line, no return channel.
pub trait LedBus {
    /// Set the data line level.
    fn write_data(&mut self, high: bool);

    /// Emit one clock pulse: low, half-period, high, half-period.
    ///
    /// The strip samples the data line on this pulse.
    fn pulse_clock(&mut self);
}

#[cfg(all(target_os = "linux", feature = "gpio"))]
pub use gpio::{GpioBus, GpioError};

#[cfg(all(target_os = "linux", feature = "gpio"))]
mod gpio {
    use super::LedBus;
    use rppal::gpio::{Gpio, OutputPin};
    use std::time::{Duration, Instant};

    /// Half-period of the clock. The strip's receiver wants ~20 µs per
    /// level, ~40 µs per bit, ~5 ms per full frame.
    const HALF_PERIOD: Duration = Duration::from_micros(20);

    /// Error type for GPIO bus setup
    #[derive(Debug, thiserror::Error)]
    pub enum GpioError {
        #[error("GPIO subsystem unavailable: {0}")]
        Unavailable(String),

        #[error("Cannot claim pin {pin}: {source}")]
        Pin {
            pin: u8,
            source: rppal::gpio::Error,
        },
    }

    /// Real GPIO-backed bus for the Raspberry Pi.
    ///
    /// Pins are claimed low at startup and released (reset to input) when
    /// the bus is dropped.
    pub struct GpioBus {
        clock: OutputPin,
        data: OutputPin,
    }

    impl GpioBus {
        /// Claim the clock and data pins (BCM numbering).
        pub fn new(clk_pin: u8, dat_pin: u8) -> Result<Self, GpioError> {
            let gpio = Gpio::new().map_err(|e| GpioError::Unavailable(e.to_string()))?;
            let clock = gpio
                .get(clk_pin)
                .map_err(|source| GpioError::Pin { pin: clk_pin, source })?
                .into_output_low();
            let data = gpio
                .get(dat_pin)
                .map_err(|source| GpioError::Pin { pin: dat_pin, source })?
                .into_output_low();
            log::info!("LED bus claimed: CLK=BCM{}, DAT=BCM{}", clk_pin, dat_pin);
            Ok(Self { clock, data })
        }

        /// Busy-wait for one half-period. thread::sleep granularity on the
        /// Pi is far coarser than 20 µs, which stretches frames enough for
        /// the strip to lose sync.
        fn half_period() {
            let start = Instant::now();
            while start.elapsed() < HALF_PERIOD {
                std::hint::spin_loop();
            }
        }
    }

    impl LedBus for GpioBus {
        fn write_data(&mut self, high: bool) {
            if high {
                self.data.set_high();
            } else {
                self.data.set_low();
            }
        }

        fn pulse_clock(&mut self) {
            self.clock.set_low();
            Self::half_period();
            self.clock.set_high();
            Self::half_period();
        }
    }
}

/// Stub bus that only logs; lets the daemon run on a bench without the
/// strip (or on a non-Pi machine).
pub struct NullBus;

impl LedBus for NullBus {
    fn write_data(&mut self, _high: bool) {}

    fn pulse_clock(&mut self) {}
}

/// Recording fake: captures the data line level at each clock pulse, which
/// is exactly what the strip's shift register sees.
#[cfg(test)]
pub(crate) struct RecordingBus {
    data_high: bool,
    pub pulses: Vec<bool>,
}

#[cfg(test)]
impl RecordingBus {
    pub fn new() -> Self {
        Self {
            data_high: false,
            pulses: Vec::new(),
        }
    }

    /// Decode the last transmitted frame: 32 low sync pulses, 32 word bits,
    /// 32 low sync pulses.
    pub fn last_frame(&self) -> Option<(u32, &[bool], &[bool])> {
        if self.pulses.len() < 96 {
            return None;
        }
        let tail = &self.pulses[self.pulses.len() - 96..];
        let (start, rest) = tail.split_at(32);
        let (bits, end) = rest.split_at(32);
        let word = bits
            .iter()
            .fold(0u32, |acc, &bit| (acc << 1) | u32::from(bit));
        Some((word, start, end))
    }
}

#[cfg(test)]
impl LedBus for RecordingBus {
    fn write_data(&mut self, high: bool) {
        self.data_high = high;
    }

    fn pulse_clock(&mut self) {
        self.pulses.push(self.data_high);
    }
}
