//! Two-stage smoothing primitives
//!
//! Raw color samples arrive at 10 Hz from the camera and are noisy enough to
//! make the LEDs flash. Both the conditioning pipeline and the LED driver
//! smooth them with the same two stages: a fixed-size ring-buffer mean to
//! knock down single-frame spikes, then an exponential moving average whose
//! coefficient sets the integration time.
//!
//! Each smoothed channel owns its state; nothing here is shared or global.

/// Default ring buffer capacity.
pub const DEFAULT_BUFFER_SIZE: usize = 5;

/// Default EMA coefficient for the conditioning pipeline.
///
/// Deliberately tiny: at a 10 Hz input rate this integrates over multiple
/// seconds, which is what keeps the installation's light from flickering.
pub const PIPELINE_ALPHA: f32 = 0.0005;

/// Default EMA coefficient for the LED driver's local stage.
///
/// Much faster than the pipeline: its job is only to protect the hardware
/// from step changes if the upstream smoothing is ever bypassed.
pub const LED_ALPHA: f32 = 0.15;

/// Fixed-capacity ring buffer over `f32` samples.
///
/// The buffer is pre-filled with zeros, so the mean is defined from the
/// first push and the strip ramps up from dark at startup.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    samples: Vec<f32>,
    next: usize,
}

impl RingBuffer {
    /// Create a zero-filled buffer of the given capacity (at least 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity.max(1)],
            next: 0,
        }
    }

    /// Push a sample, evicting the oldest.
    pub fn push(&mut self, sample: f32) {
        self.samples[self.next] = sample;
        self.next = (self.next + 1) % self.samples.len();
    }

    /// Arithmetic mean of the buffer. Always defined.
    pub fn mean(&self) -> f32 {
        self.samples.iter().sum::<f32>() / self.samples.len() as f32
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

/// Exponential moving average: `ema' = alpha * new + (1 - alpha) * ema`.
///
/// Seeding policy: an uninitialized EMA adopts the first sample directly
/// instead of blending it against an arbitrary starting value. Blending the
/// first real sample against zero with a small alpha would pin the output
/// near zero for minutes. Components that *want* a dark start (the LED
/// driver) seed explicitly with [`Ema::with_initial`].
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f32,
    value: Option<f32>,
}

impl Ema {
    /// Uninitialized EMA; the first update seeds it.
    pub fn new(alpha: f32) -> Self {
        Self { alpha, value: None }
    }

    /// EMA seeded with an explicit starting value.
    pub fn with_initial(alpha: f32, initial: f32) -> Self {
        Self {
            alpha,
            value: Some(initial),
        }
    }

    /// Feed a sample and return the new average.
    pub fn update(&mut self, sample: f32) -> f32 {
        let next = match self.value {
            None => sample,
            Some(current) => self.alpha * sample + (1.0 - self.alpha) * current,
        };
        self.value = Some(next);
        next
    }

    /// Current value, if any sample has been seen (or a seed was given).
    pub fn value(&self) -> Option<f32> {
        self.value
    }
}

/// One smoothed channel: ring-buffer mean feeding an EMA.
#[derive(Debug, Clone)]
pub struct SmoothedChannel {
    ring: RingBuffer,
    ema: Ema,
}

impl SmoothedChannel {
    /// Channel with an uninitialized EMA (first mean seeds it).
    pub fn new(alpha: f32, buffer_size: usize) -> Self {
        Self {
            ring: RingBuffer::new(buffer_size),
            ema: Ema::new(alpha),
        }
    }

    /// Channel whose EMA starts at zero (dark start for hardware).
    pub fn zero_seeded(alpha: f32, buffer_size: usize) -> Self {
        Self {
            ring: RingBuffer::new(buffer_size),
            ema: Ema::with_initial(alpha, 0.0),
        }
    }

    /// Feed a raw sample through both stages and return the smoothed value.
    pub fn feed(&mut self, raw: f32) -> f32 {
        self.ring.push(raw);
        self.ema.update(self.ring.mean())
    }

    /// Current smoothed value without feeding a sample.
    pub fn value(&self) -> Option<f32> {
        self.ema.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_mean_over_full_buffer() {
        let mut ring = RingBuffer::new(5);
        for v in [10.0, 20.0, 30.0, 40.0, 50.0] {
            ring.push(v);
        }
        assert_eq!(ring.mean(), 30.0);
    }

    #[test]
    fn ring_evicts_oldest() {
        let mut ring = RingBuffer::new(5);
        for v in [10.0, 20.0, 30.0, 40.0, 50.0] {
            ring.push(v);
        }
        ring.push(60.0); // evicts 10
        assert_eq!(ring.mean(), 40.0);
    }

    #[test]
    fn ring_starts_zero_filled() {
        let mut ring = RingBuffer::new(5);
        assert_eq!(ring.mean(), 0.0);
        ring.push(50.0);
        assert_eq!(ring.mean(), 10.0);
    }

    #[test]
    fn ema_first_sample_seeds() {
        // The seeding policy: no blending against an implicit zero
        let mut ema = Ema::new(0.0005);
        assert_eq!(ema.update(86.0), 86.0);
        assert_eq!(ema.value(), Some(86.0));
    }

    #[test]
    fn ema_recurrence_after_seed() {
        let alpha = 0.25;
        let mut ema = Ema::new(alpha);
        ema.update(100.0);
        let next = ema.update(0.0);
        assert!((next - (1.0 - alpha) * 100.0).abs() < 1e-6);
        let next2 = ema.update(0.0);
        assert!((next2 - (1.0 - alpha) * (1.0 - alpha) * 100.0).abs() < 1e-6);
    }

    #[test]
    fn zero_seeded_ema_blends_from_zero() {
        let mut ema = Ema::with_initial(0.15, 0.0);
        let first = ema.update(100.0);
        assert!((first - 15.0).abs() < 1e-4);
    }

    #[test]
    fn slow_channel_barely_moves_fast_channel_converges() {
        // Same alternating input through both stages: the pipeline alpha
        // moves a small fraction toward the mean per update, the LED alpha
        // visibly converges over the same samples.
        let input = [10.0, 200.0, 10.0, 200.0, 10.0];

        let mut slow = SmoothedChannel::new(PIPELINE_ALPHA, 5);
        let mut fast = SmoothedChannel::zero_seeded(LED_ALPHA, 5);
        let mut slow_out = 0.0;
        let mut fast_out = 0.0;
        for &v in &input {
            slow_out = slow.feed(v);
            fast_out = fast.feed(v);
        }

        // Mean of the full buffer is 86
        assert!((slow.ring.mean() - 86.0).abs() < 0.001);

        // Slow channel seeded on the first mean (2.0), then crept up only
        // fractionally despite means in the tens
        assert!(slow_out < 3.0, "slow channel moved too fast: {slow_out}");

        // Fast channel covered a large share of the distance already
        assert!(fast_out > 20.0, "fast channel too slow: {fast_out}");
        assert!(fast_out < 86.0);
    }
}
