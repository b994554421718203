//! Per-channel conditioning state machine
//!
//! Six independent channels (r, g, b, h, s, v), each owning its own
//! ring buffer and EMA; buffers are never shared across channels. The
//! pipeline is pure message-in/messages-out, which keeps it testable
//! without sockets.

use tourne_core::message::{Arg, Message};
use tourne_core::smoothing::SmoothedChannel;

/// Raw RGB triple from the perception adapter.
pub const RAW_RGB_TOPIC: &str = "/color/raw/rgb";

/// Raw HSV triple from the perception adapter.
pub const RAW_HSV_TOPIC: &str = "/color/raw/hsv";

/// Grouped smoothed triple consumed by the LED driver.
const SMOOTH_RGB_TOPIC: &str = "/color/rgb";

const RGB_NAMES: [&str; 3] = ["r", "g", "b"];
const HSV_NAMES: [&str; 3] = ["h", "s", "v"];

/// The full conditioning pipeline: one state instance per logical channel.
pub struct Pipeline {
    rgb: [SmoothedChannel; 3],
    hsv: [SmoothedChannel; 3],
}

impl Pipeline {
    /// Build with the configured EMA coefficient and buffer capacity.
    pub fn new(alpha: f32, buffer_size: usize) -> Self {
        Self {
            rgb: std::array::from_fn(|_| SmoothedChannel::new(alpha, buffer_size)),
            hsv: std::array::from_fn(|_| SmoothedChannel::new(alpha, buffer_size)),
        }
    }

    /// Process one inbound message, returning the messages to publish.
    ///
    /// Malformed input (unexpected topic, wrong arity, non-finite values)
    /// advances no channel state and publishes nothing: downstream keeps
    /// its last stable value.
    pub fn handle(&mut self, msg: &Message) -> Vec<Message> {
        match msg.topic.as_str() {
            RAW_RGB_TOPIC => match msg.finite_args::<3>() {
                Some(raw) => self.feed_rgb(raw),
                None => {
                    log::warn!("Dropping malformed sample: {}", msg);
                    Vec::new()
                }
            },
            RAW_HSV_TOPIC => match msg.finite_args::<3>() {
                Some(raw) => self.feed_hsv(raw),
                None => {
                    log::warn!("Dropping malformed sample: {}", msg);
                    Vec::new()
                }
            },
            other => {
                log::debug!("Ignoring unexpected topic {}", other);
                Vec::new()
            }
        }
    }

    /// Feed an RGB triple; emit the grouped triple plus per-channel scalars.
    fn feed_rgb(&mut self, raw: [f32; 3]) -> Vec<Message> {
        let mut smoothed = [0i32; 3];
        for (channel, (&value, out)) in self.rgb.iter_mut().zip(raw.iter().zip(&mut smoothed)) {
            // Truncate to integer only at the boundary; state stays float
            *out = channel.feed(value) as i32;
        }

        let mut out = Vec::with_capacity(4);
        out.push(Message::new(
            SMOOTH_RGB_TOPIC,
            smoothed.iter().map(|&v| Arg::Int(v)),
        ));
        for (name, &value) in RGB_NAMES.iter().zip(&smoothed) {
            out.push(Message::int(format!("{}/{}", SMOOTH_RGB_TOPIC, name), value));
        }
        out
    }

    /// Feed an HSV triple; emit per-channel scalars.
    fn feed_hsv(&mut self, raw: [f32; 3]) -> Vec<Message> {
        let mut out = Vec::with_capacity(3);
        for (channel, (name, &value)) in self
            .hsv
            .iter_mut()
            .zip(HSV_NAMES.iter().zip(raw.iter()))
        {
            let smoothed = channel.feed(value) as i32;
            out.push(Message::int(format!("/color/hsv/{}", name), smoothed));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb_msg(r: i32, g: i32, b: i32) -> Message {
        Message::new(RAW_RGB_TOPIC, [Arg::Int(r), Arg::Int(g), Arg::Int(b)])
    }

    #[test]
    fn publishes_triple_and_scalars() {
        let mut pipeline = Pipeline::new(0.0005, 5);
        let out = pipeline.handle(&rgb_msg(100, 150, 200));

        assert_eq!(out.len(), 4);
        assert_eq!(out[0].topic, "/color/rgb");
        assert_eq!(out[0].args.len(), 3);
        assert_eq!(out[1].topic, "/color/rgb/r");
        assert_eq!(out[2].topic, "/color/rgb/g");
        assert_eq!(out[3].topic, "/color/rgb/b");
    }

    #[test]
    fn first_sample_seeds_ema_with_buffer_mean() {
        // Buffer is zero-filled: one sample of 100 gives a mean of 20,
        // and the seeding policy adopts that mean directly.
        let mut pipeline = Pipeline::new(0.0005, 5);
        let out = pipeline.handle(&rgb_msg(100, 100, 100));
        assert_eq!(out[0].args, vec![Arg::Int(20), Arg::Int(20), Arg::Int(20)]);
    }

    #[test]
    fn slow_alpha_barely_moves_after_seed() {
        let mut pipeline = Pipeline::new(0.0005, 5);
        let mut last = Vec::new();
        for _ in 0..10 {
            last = pipeline.handle(&rgb_msg(200, 200, 200));
        }
        // Mean reaches 200 after five pushes, but the EMA crept up from its
        // seed of 40 by only a fraction of a unit per update
        let value = last[0].args[0].as_i32();
        assert!(value >= 40 && value <= 42, "value = {}", value);
    }

    #[test]
    fn alternating_input_intermediate_mean() {
        // Ring of 5 fed [10,200,10,200,10]: final buffer mean is 86
        let mut pipeline = Pipeline::new(0.0005, 5);
        for v in [10, 200, 10, 200, 10] {
            pipeline.handle(&rgb_msg(v, v, v));
        }
        // Seed was the first mean (2); published EMA has moved only a
        // small fraction toward 86
        let out = pipeline.handle(&rgb_msg(10, 10, 10));
        let value = out[0].args[0].as_i32();
        assert!(value < 5, "value = {}", value);
    }

    #[test]
    fn wrong_arity_drops_sample_without_state_change() {
        let mut pipeline = Pipeline::new(0.5, 5);
        pipeline.handle(&rgb_msg(100, 100, 100));

        let malformed = Message::new(RAW_RGB_TOPIC, [Arg::Int(1), Arg::Int(2)]);
        assert!(pipeline.handle(&malformed).is_empty());

        // Next good sample continues from unchanged state: the buffer holds
        // [100, 100, 0, 0, 0] after this push, not [100, 1, 100, ...]
        let out = pipeline.handle(&rgb_msg(100, 100, 100));
        assert_eq!(out[0].args[0].as_i32(), 30); // 0.5*40 + 0.5*20
    }

    #[test]
    fn nan_is_rejected() {
        let mut pipeline = Pipeline::new(0.5, 5);
        let msg = Message::new(
            RAW_RGB_TOPIC,
            [Arg::Float(f32::NAN), Arg::Float(1.0), Arg::Float(1.0)],
        );
        assert!(pipeline.handle(&msg).is_empty());
    }

    #[test]
    fn hsv_channels_are_independent_of_rgb() {
        let mut pipeline = Pipeline::new(0.5, 5);
        pipeline.handle(&rgb_msg(250, 250, 250));

        let hsv = Message::new(RAW_HSV_TOPIC, [Arg::Int(0), Arg::Int(0), Arg::Int(0)]);
        let out = pipeline.handle(&hsv);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].topic, "/color/hsv/h");
        // HSV buffers saw nothing from the RGB feed
        assert_eq!(out[0].args[0].as_i32(), 0);
    }
}
