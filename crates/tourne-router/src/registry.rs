//! Dynamic module registration
//!
//! Modules that come and go (the music engine, debug probes) register a
//! runtime endpoint by sending `/register/<module>` with their local port
//! as the single integer argument. The host is taken from the datagram's
//! source address, so registration works unchanged from another machine.
//!
//! The map is last-write-wins with no expiry; it resets only on router
//! restart. Handlers may run concurrently, hence the mutex.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;

use tourne_core::message::{Arg, Message};

/// Control prefix: binds a module name to an endpoint.
pub const REGISTER_PREFIX: &str = "/register/";

/// Event prefix: routed normally plus direct delivery to the registered module.
pub const EVENT_PREFIX: &str = "/event/";

/// Registration map: logical module name → ephemeral endpoint.
#[derive(Debug, Default)]
pub struct Registry {
    endpoints: Mutex<HashMap<String, SocketAddr>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a `/register/<module>` message sent from `src`.
    ///
    /// Returns the bound endpoint on success. Malformed payloads (missing
    /// module name, wrong arity, non-integer or out-of-range port) are
    /// rejected without side effects.
    pub fn register(&self, msg: &Message, src: SocketAddr) -> Option<SocketAddr> {
        let module = msg.topic.strip_prefix(REGISTER_PREFIX)?;
        if module.is_empty() || module.contains('/') {
            log::warn!("Ignoring registration with bad module name: {}", msg.topic);
            return None;
        }

        let port = match msg.args.as_slice() {
            [Arg::Int(port)] if (1..=u16::MAX as i32).contains(port) => *port as u16,
            _ => {
                log::warn!("Ignoring malformed registration payload: {}", msg);
                return None;
            }
        };

        let endpoint = SocketAddr::new(src.ip(), port);
        let previous = self
            .endpoints
            .lock()
            .expect("registry mutex poisoned")
            .insert(module.to_string(), endpoint);

        match previous {
            Some(old) if old != endpoint => {
                log::info!("Module '{}' re-registered: {} -> {}", module, old, endpoint);
            }
            None => log::info!("Module '{}' registered at {}", module, endpoint),
            _ => {}
        }
        Some(endpoint)
    }

    /// Look up the registered endpoint for a module, if any.
    pub fn lookup(&self, module: &str) -> Option<SocketAddr> {
        self.endpoints
            .lock()
            .expect("registry mutex poisoned")
            .get(module)
            .copied()
    }

    /// Registered endpoint for the target of an `/event/<module>` topic.
    pub fn event_target(&self, topic: &str) -> Option<SocketAddr> {
        let module = topic.strip_prefix(EVENT_PREFIX)?;
        // The module name may be followed by a sub-path: /event/music/cue
        let module = module.split('/').next()?;
        self.lookup(module)
    }

    pub fn len(&self) -> usize {
        self.endpoints.lock().expect("registry mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
