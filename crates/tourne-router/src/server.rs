//! Router server loop
//!
//! One inbound UDP socket; each datagram is decoded for its topic, resolved
//! against the routing table, and the original bytes are forwarded to every
//! destination in the resolved set. Delivery is best-effort: a failed send
//! to one destination never aborts the others, and nothing is retried.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use anyhow::{Context, Result};
use tourne_core::config::NetworkConfig;
use tourne_core::wire;

use crate::registry::{Registry, EVENT_PREFIX, REGISTER_PREFIX};
use crate::routes::{Resolution, RoutingTable};

/// A configured destination with its own outbound client handle.
struct DestinationClient {
    name: String,
    addr: SocketAddr,
    socket: UdpSocket,
}

impl DestinationClient {
    fn new(name: &str, host: &str, port: u16) -> Result<Self> {
        let addr = (host, port)
            .to_socket_addrs()
            .with_context(|| format!("Cannot resolve destination '{}' ({}:{})", name, host, port))?
            .next()
            .with_context(|| format!("No address for destination '{}'", name))?;
        let socket = UdpSocket::bind("0.0.0.0:0")
            .with_context(|| format!("Cannot bind outbound socket for '{}'", name))?;
        Ok(Self {
            name: name.to_string(),
            addr,
            socket,
        })
    }

    /// Fire-and-forget send of the raw datagram.
    fn send(&self, payload: &[u8]) {
        if let Err(e) = self.socket.send_to(payload, self.addr) {
            log::warn!("Send to '{}' ({}) failed: {}", self.name, self.addr, e);
        }
    }
}

/// The message router: inbound socket, static tables, dynamic registry.
pub struct Router {
    socket: UdpSocket,
    table: RoutingTable,
    destinations: Vec<DestinationClient>,
    registry: Registry,
    /// Outbound handle for direct-to-registered-endpoint event delivery
    direct: UdpSocket,
}

impl Router {
    /// Bind the inbound socket and build the immutable tables.
    ///
    /// Any configuration fault here is fatal: a router with a broken table
    /// would silently misroute the whole installation.
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let table = RoutingTable::from_rules(&config.routes).context("Invalid routing rules")?;

        let mut destinations = Vec::with_capacity(config.destinations.len());
        for dest in &config.destinations {
            destinations.push(DestinationClient::new(&dest.name, &dest.host, dest.port)?);
        }

        // Warn about rules naming unknown destinations now; delivery will
        // log-and-skip them per message.
        for rule in &config.routes {
            for name in &rule.to {
                if !destinations.iter().any(|d| &d.name == name) {
                    log::warn!("Route names unknown destination '{}'", name);
                }
            }
        }

        let socket = UdpSocket::bind(config.router.addr())
            .with_context(|| format!("Cannot bind router socket on {}", config.router.addr()))?;
        let direct =
            UdpSocket::bind("0.0.0.0:0").context("Cannot bind direct-delivery socket")?;

        log::info!(
            "Router listening on {} ({} rules, {} destinations)",
            config.router.addr(),
            table.rule_count(),
            destinations.len()
        );

        Ok(Self {
            socket,
            table,
            destinations,
            registry: Registry::new(),
            direct,
        })
    }

    /// Receive and dispatch datagrams until the socket fails.
    pub fn serve(&self) -> Result<()> {
        let mut buf = [0u8; 1536];
        loop {
            let (len, src) = self
                .socket
                .recv_from(&mut buf)
                .context("Router socket receive failed")?;
            self.handle_datagram(&buf[..len], src);
        }
    }

    /// Decode, resolve, and fan out one datagram.
    pub fn handle_datagram(&self, payload: &[u8], src: SocketAddr) {
        let msg = match wire::decode(payload) {
            Ok(msg) => msg,
            Err(e) => {
                log::warn!("Dropping malformed datagram from {}: {}", src, e);
                return;
            }
        };

        // Control topic: consumed by the router, never forwarded.
        if msg.topic.starts_with(REGISTER_PREFIX) {
            self.registry.register(&msg, src);
            return;
        }

        match self.table.resolve(&msg.topic) {
            Resolution::Exact(names) | Resolution::Prefix(names) => {
                for name in names {
                    match self.destinations.iter().find(|d| &d.name == name) {
                        Some(dest) => dest.send(payload),
                        None => {
                            log::warn!("Skipping unknown destination '{}' for {}", name, msg.topic);
                        }
                    }
                }
            }
            Resolution::Broadcast => {
                log::info!("No route for {}, broadcasting", msg.topic);
                for dest in &self.destinations {
                    dest.send(payload);
                }
            }
        }

        // Dual delivery for /event/<module>: routed above, and sent directly
        // to the module's registered endpoint as well.
        if msg.topic.starts_with(EVENT_PREFIX) {
            if let Some(endpoint) = self.registry.event_target(&msg.topic) {
                if let Err(e) = self.direct.send_to(payload, endpoint) {
                    log::warn!("Direct event delivery to {} failed: {}", endpoint, e);
                }
            }
        }
    }

    /// Access the registry (for tests and diagnostics).
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tourne_core::config::{Destination, ListenConfig, RouteRule};
    use tourne_core::message::Message;

    /// A local UDP listener standing in for a destination process.
    struct Listener {
        socket: UdpSocket,
        port: u16,
    }

    impl Listener {
        fn bind() -> Self {
            let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
            socket
                .set_read_timeout(Some(Duration::from_millis(200)))
                .unwrap();
            let port = socket.local_addr().unwrap().port();
            Self { socket, port }
        }

        fn recv(&self) -> Option<Vec<u8>> {
            let mut buf = [0u8; 1536];
            match self.socket.recv_from(&mut buf) {
                Ok((len, _)) => Some(buf[..len].to_vec()),
                Err(_) => None,
            }
        }
    }

    fn make_router(listeners: &[(&str, &Listener)], routes: Vec<RouteRule>) -> Router {
        let config = NetworkConfig {
            router: ListenConfig {
                host: String::from("127.0.0.1"),
                port: 0,
            },
            destinations: listeners
                .iter()
                .map(|(name, l)| Destination {
                    name: name.to_string(),
                    host: String::from("127.0.0.1"),
                    port: l.port,
                })
                .collect(),
            routes,
            ..NetworkConfig::default()
        };
        Router::new(&config).unwrap()
    }

    fn exact(topic: &str, to: &[&str]) -> RouteRule {
        RouteRule {
            topic: Some(topic.to_string()),
            prefix: None,
            to: to.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn prefix(p: &str, to: &[&str]) -> RouteRule {
        RouteRule {
            topic: None,
            prefix: Some(p.to_string()),
            to: to.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn src() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[test]
    fn forwards_raw_bytes_to_exact_destination_only() {
        let signal = Listener::bind();
        let led = Listener::bind();
        let router = make_router(
            &[("signal", &signal), ("led", &led)],
            vec![exact("/color/raw/rgb", &["signal"])],
        );

        let payload = wire::encode(&Message::new(
            "/color/raw/rgb",
            [120.into(), 30.into(), 5.into()],
        ));
        router.handle_datagram(&payload, src());

        assert_eq!(signal.recv(), Some(payload));
        assert_eq!(led.recv(), None);
    }

    #[test]
    fn unrouted_topic_reaches_every_destination() {
        let a = Listener::bind();
        let b = Listener::bind();
        let router = make_router(&[("a", &a), ("b", &b)], vec![exact("/other", &["a"])]);

        let payload = wire::encode(&Message::int("/music/status", 1));
        router.handle_datagram(&payload, src());

        assert_eq!(a.recv(), Some(payload.clone()));
        assert_eq!(b.recv(), Some(payload));
    }

    #[test]
    fn unknown_destination_is_skipped_not_fatal() {
        let led = Listener::bind();
        let router = make_router(
            &[("led", &led)],
            vec![prefix("/color/", &["ghost", "led"])],
        );

        let payload = wire::encode(&Message::int("/color/rgb", 255));
        router.handle_datagram(&payload, src());

        assert_eq!(led.recv(), Some(payload));
    }

    #[test]
    fn event_topic_gets_dual_delivery() {
        let music_routed = Listener::bind();
        let music_registered = Listener::bind();
        let router = make_router(
            &[("music", &music_routed)],
            vec![prefix("/event/", &["music"])],
        );

        // Register the module's runtime endpoint
        let reg = wire::encode(&Message::int(
            "/register/music_engine",
            music_registered.port as i32,
        ));
        router.handle_datagram(&reg, src());
        assert_eq!(router.registry().len(), 1);

        let payload = wire::encode(&Message::int("/event/music_engine", 7));
        router.handle_datagram(&payload, src());

        // Routed copy and direct copy both arrive
        assert_eq!(music_routed.recv(), Some(payload.clone()));
        assert_eq!(music_registered.recv(), Some(payload));
    }

    #[test]
    fn register_topic_is_consumed_not_forwarded() {
        let a = Listener::bind();
        let router = make_router(&[("a", &a)], vec![]);

        let reg = wire::encode(&Message::int("/register/probe", 12345));
        router.handle_datagram(&reg, src());

        // No broadcast of control traffic
        assert_eq!(a.recv(), None);
        assert_eq!(router.registry().lookup("probe").unwrap().port(), 12345);
    }

    #[test]
    fn malformed_datagram_is_dropped() {
        let a = Listener::bind();
        let router = make_router(&[("a", &a)], vec![]);

        router.handle_datagram(b"not osc at all", src());
        assert_eq!(a.recv(), None);
    }
}
