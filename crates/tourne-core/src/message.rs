//! Topic-addressed message model
//!
//! A message is a hierarchical topic string plus an ordered list of numeric
//! arguments. There is no identity beyond topic + payload and no persistence;
//! messages are fire-and-forget datagrams.

use std::fmt;

/// A single message argument.
///
/// The argument set is deliberately closed to the two numeric types the
/// installation exchanges. Anything else on the wire is rejected at decode
/// time rather than smuggled through as an opaque blob.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg {
    Int(i32),
    Float(f32),
}

impl Arg {
    /// Interpret the argument as an integer, truncating floats.
    pub fn as_i32(&self) -> i32 {
        match self {
            Arg::Int(v) => *v,
            Arg::Float(v) => *v as i32,
        }
    }

    /// Interpret the argument as a float.
    pub fn as_f32(&self) -> f32 {
        match self {
            Arg::Int(v) => *v as f32,
            Arg::Float(v) => *v,
        }
    }

    /// Whether the argument is a finite number.
    ///
    /// Integers are always finite; floats can carry NaN/Inf off the wire.
    pub fn is_finite(&self) -> bool {
        match self {
            Arg::Int(_) => true,
            Arg::Float(v) => v.is_finite(),
        }
    }
}

impl From<i32> for Arg {
    fn from(v: i32) -> Self {
        Arg::Int(v)
    }
}

impl From<f32> for Arg {
    fn from(v: f32) -> Self {
        Arg::Float(v)
    }
}

/// A routable message: topic plus ordered numeric arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Hierarchical topic, e.g. `/color/raw/rgb`
    pub topic: String,
    /// Ordered argument list
    pub args: Vec<Arg>,
}

impl Message {
    /// Build a message from a topic and anything convertible to arguments.
    pub fn new(topic: impl Into<String>, args: impl IntoIterator<Item = Arg>) -> Self {
        Self {
            topic: topic.into(),
            args: args.into_iter().collect(),
        }
    }

    /// Build a message carrying a single integer.
    pub fn int(topic: impl Into<String>, value: i32) -> Self {
        Self::new(topic, [Arg::Int(value)])
    }

    /// Validate arity and finiteness at the boundary.
    ///
    /// Returns the arguments as a fixed-size array when the message carries
    /// exactly `N` finite numeric values, `None` otherwise. Consumers use
    /// this to fail closed on malformed payloads.
    pub fn finite_args<const N: usize>(&self) -> Option<[f32; N]> {
        if self.args.len() != N {
            return None;
        }
        let mut out = [0.0f32; N];
        for (slot, arg) in out.iter_mut().zip(&self.args) {
            if !arg.is_finite() {
                return None;
            }
            *slot = arg.as_f32();
        }
        Some(out)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.topic)?;
        for arg in &self.args {
            match arg {
                Arg::Int(v) => write!(f, " {}", v)?,
                Arg::Float(v) => write!(f, " {:.3}", v)?,
            }
        }
        Ok(())
    }
}
