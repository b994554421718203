//! Central message router
//!
//! Every inter-module message in the installation passes through one inbound
//! UDP address. The router decodes each datagram just far enough to resolve
//! a destination set, then forwards the original bytes unmodified.
//!
//! Resolution order, per message:
//! 1. exact topic match in the rule table
//! 2. first declared prefix rule that strictly prefixes the topic
//! 3. broadcast to every configured destination (logged once per message)
//!
//! Two reserved prefixes sit in front of normal resolution:
//! - `/register/<module>` binds a module name to the sender's address and
//!   a payload-supplied port (dynamic registration, last-write-wins)
//! - `/event/<module>` resolves normally AND is additionally delivered to
//!   the module's registered endpoint. The dual delivery is intentional:
//!   statically-routed listeners and the registered module both hear it.

mod registry;
mod routes;
mod server;

pub use registry::{Registry, EVENT_PREFIX, REGISTER_PREFIX};
pub use routes::{Resolution, RoutesError, RoutingTable};
pub use server::Router;
