//! Distance-vector routing core for a small (<=10 node) mesh of long-range
//! radio nodes. See `SPEC_FULL.md` at the repository root for the full
//! specification this crate implements.
//!
//! Module map:
//! - [`clock`] — monotonic millisecond time source.
//! - [`mac`] / [`identity`] — hardware addressing and the compiled-in
//!   node-id <-> MAC directory.
//! - [`codec`] — HELLO / ROUTINGID / ROUTING frame parsing and emission.
//! - [`table`] — the fixed ten-slot routing table.
//! - [`engine`] — admission, Bellman-Ford relaxation, forwarding.
//! - [`radio`] — the `RadioLink` contract and an in-process simulated link.
//! - [`tick`] — the cooperative scheduler that drives the engine over time.
//! - [`config`] — ambient TOML topology loader for tests/demo tooling.

pub mod clock;
pub mod codec;
pub mod config;
pub mod engine;
pub mod identity;
pub mod mac;
pub mod radio;
pub mod table;
pub mod tick;

#[cfg(test)]
mod test_support;

pub use engine::{ForwardError, RoutingEngine};
pub use identity::{IdentityTable, NodeId};
pub use mac::Mac;
pub use radio::{RadioError, RadioLink, SimulatedRadioLink};
pub use table::{RouteEntry, RoutingTable};
pub use tick::{StepOutcome, TickDriver};
