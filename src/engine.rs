//! Routing engine: admits inbound frames, runs local Bellman-Ford
//! relaxation, ages the table, and decides forwarding/advertisement.
//!
//! One struct owns all mutable state for a node; each kind of inbound item
//! gets its own `admit_*` method, and a `log` call marks each point where
//! state actually changes.

use log::{debug, trace, warn};

use crate::clock::{elapsed_exceeds, Clock, MillisTime};
use crate::codec::{self, entry_is_admissible, Frame, VectorEntry};
use crate::identity::{IdentityTable, NodeId};
use crate::mac::Mac;
use crate::table::{RouteEntry, RoutingTable};

/// Entry stays usable for forwarding for this long after `last_updated`.
pub const FORWARD_STALENESS_MS: MillisTime = 10_000;
/// Entry is evicted from the table after this long without an update.
pub const ENTRY_TIMEOUT_MS: MillisTime = 60_000;
/// Number of Bellman-Ford relaxation passes per run (`N - 1` for `N = 10`).
pub const RELAXATION_PASSES: usize = 9;

/// Outcome of a [`RoutingEngine::forward`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ForwardError {
    #[error("no route to node {0}")]
    RouteMissing(NodeId),
    #[error("route to node {0} is stale")]
    RouteStale(NodeId),
}

/// Owns the routing table and identity for one node, and implements every
/// admission, relaxation, and forwarding state transition.
pub struct RoutingEngine {
    identity: IdentityTable,
    table: RoutingTable,
}

impl RoutingEngine {
    pub fn new(identity: IdentityTable) -> Self {
        Self { identity, table: RoutingTable::new() }
    }

    pub fn own_id(&self) -> NodeId {
        self.identity.own_id()
    }

    pub fn own_mac(&self) -> Mac {
        self.identity.own_mac()
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Feeds one inbound, already framing-checked frame to the engine.
    /// `now` is the arrival time and `rssi` is the packet's RSSI.
    pub fn admit_frame(&mut self, frame: Frame, rssi: i16, now: MillisTime) {
        match frame {
            Frame::Hello { mac } => self.admit_hello(mac, rssi, now),
            Frame::RoutingId { sender_id, entries } => self.admit_routing_vector(sender_id, &entries, rssi, now),
            Frame::LegacyRouting => trace!("dropped legacy ROUTING frame"),
        }
    }

    /// Admits a HELLO: always refreshes (or creates) the direct-neighbor
    /// entry for the sender; never creates multi-hop routes.
    pub fn admit_hello(&mut self, mac: Mac, rssi: i16, now: MillisTime) {
        let own_id = self.own_id();
        let next_hop_id = self.identity.mac_to_id(mac).unwrap_or(own_id);
        if next_hop_id == own_id {
            // Either our own MAC looped back, or the sender is outside the
            // compiled-in directory; either way there is nothing useful to
            // admit as a destination.
            if self.identity.mac_to_id(mac).is_none() {
                trace!("HELLO from unknown MAC {mac} ignored");
            }
            return;
        }

        let existing = self.table.find_by_destination(next_hop_id).or_else(|| self.table.find_by_mac(mac));
        let destination = existing.map(|e| e.destination).unwrap_or(next_hop_id);

        let entry = RouteEntry {
            destination,
            mac,
            rssi,
            cost: -(rssi as i32),
            next_hop_id,
            next_hop_mac: mac,
            last_updated: now,
        };
        if self.table.upsert(entry) {
            debug!("admitted HELLO from node {next_hop_id} (rssi={rssi})");
        } else {
            warn!("routing table full, dropped HELLO from node {next_hop_id}");
        }
    }

    /// Admits a ROUTINGID vector from `sender_id`, heard at `rssi`.
    pub fn admit_routing_vector(&mut self, sender_id: NodeId, entries: &[VectorEntry], rssi: i16, now: MillisTime) {
        let own_id = self.own_id();
        if sender_id == own_id {
            return;
        }

        let link_cost_to_sender = -(rssi as i32);
        let sender_mac = self.identity.id_to_mac(sender_id).unwrap_or_default();
        self.table.upsert(RouteEntry {
            destination: sender_id,
            mac: sender_mac,
            rssi,
            cost: link_cost_to_sender,
            next_hop_id: sender_id,
            next_hop_mac: sender_mac,
            last_updated: now,
        });
        debug!("admitted ROUTINGID header from node {sender_id} (rssi={rssi})");

        for raw_entry in entries {
            if !entry_is_admissible(raw_entry, sender_id, own_id) {
                continue;
            }
            let total = link_cost_to_sender + raw_entry.cost;
            let dest_mac = self.identity.id_to_mac(raw_entry.destination).unwrap_or_default();

            let should_update = match self.table.find_by_destination(raw_entry.destination) {
                Some(existing) => total < existing.cost,
                None => true,
            };
            if !should_update {
                continue;
            }

            let accepted = self.table.upsert(RouteEntry {
                destination: raw_entry.destination,
                mac: dest_mac,
                rssi: raw_entry.rssi,
                cost: total,
                next_hop_id: sender_id,
                next_hop_mac: sender_mac,
                last_updated: now,
            });
            if accepted {
                debug!("learned route to node {} via {} cost {}", raw_entry.destination, sender_id, total);
            } else {
                warn!("routing table full, dropped route to node {} via {}", raw_entry.destination, sender_id);
            }
        }
    }

    /// Local Bellman-Ford relaxation. Runs `RELAXATION_PASSES`
    /// full passes over every ordered pair of occupied rows.
    ///
    /// Split horizon: a row `j` whose own `next_hop_id` is this node is never
    /// used as a candidate path — it would route back through us.
    pub fn relax(&mut self) {
        let own_id = self.own_id();

        // Reset direct-neighbor rows to their raw link cost before relaxing;
        // a direct neighbor is a row whose next hop is itself.
        for entry in self.table.entries_mut() {
            if entry.next_hop_id == entry.destination {
                entry.cost = -(entry.rssi as i32);
            }
        }

        for _pass in 0..RELAXATION_PASSES {
            let snapshot: Vec<RouteEntry> = self.table.entries().copied().collect();
            for i in 0..snapshot.len() {
                for j in 0..snapshot.len() {
                    if i == j {
                        continue;
                    }
                    let via = snapshot[j];
                    if via.next_hop_id == own_id {
                        continue; // split horizon
                    }
                    let link_j = -(via.rssi as i32);
                    let candidate = link_j + via.cost;
                    let row_i = snapshot[i];
                    if candidate < row_i.cost {
                        if let Some(target) = self.table.find_by_destination_mut(row_i.destination) {
                            target.cost = candidate;
                            target.next_hop_mac = via.mac;
                            target.next_hop_id = self.identity.mac_to_id(via.mac).unwrap_or(via.next_hop_id);
                        }
                    }
                }
            }
        }
        debug!("relaxation complete over {} rows", self.table.len());
    }

    /// Evicts entries older than `ttl_ms`, logging each eviction.
    pub fn evict_stale(&mut self, now: MillisTime, ttl_ms: MillisTime) {
        for dest in self.table.evict_stale(now, ttl_ms) {
            debug!("evicted stale route to node {dest}");
        }
    }

    /// Looks up the forwarding route for `target_id`, enforcing the 10 s
    /// staleness gate (distinct from the 60 s eviction timeout).
    pub fn resolve_forward(&self, target_id: NodeId, now: MillisTime) -> Result<RouteEntry, ForwardError> {
        let entry = self.table.find_by_destination(target_id).ok_or(ForwardError::RouteMissing(target_id))?;
        if elapsed_exceeds(now, entry.last_updated, FORWARD_STALENESS_MS) {
            return Err(ForwardError::RouteStale(target_id));
        }
        Ok(*entry)
    }

    /// The payload this minimal implementation sends when forwarding to
    /// `target_id`; a production rewrite may replace this with a framed
    /// datagram but must preserve the staleness gate in `resolve_forward`.
    pub fn forward_payload(target_id: NodeId) -> String {
        format!("Data to NODE_{target_id}")
    }

    /// Serializes the ROUTINGID frame for this node's table.
    /// `split_horizon_target`, when set, suppresses rows whose next hop is
    /// that neighbor, so the advertisement never teaches it its own path
    /// back to itself.
    pub fn serialize_vector(&self, split_horizon_target: Option<NodeId>) -> String {
        let mut out = codec::encode_routingid_header(self.own_id());
        for entry in self.table.entries() {
            if Some(entry.next_hop_id) == split_horizon_target {
                continue;
            }
            out.push_str(&codec::encode_vector_entry(&VectorEntry {
                destination: entry.destination,
                rssi: entry.rssi,
                cost: entry.cost,
                next_hop_id: entry.next_hop_id,
            }));
        }
        out
    }

    pub fn broadcast_vector(&self) -> String {
        self.serialize_vector(None)
    }

    pub fn send_vector_to(&self, neighbor_id: NodeId) -> String {
        self.serialize_vector(Some(neighbor_id))
    }

    pub fn send_hello(&self) -> String {
        codec::encode_hello(self.own_id(), self.own_mac())
    }

    /// Checks the routing table's structural invariants (no self-routes, no
    /// duplicate destinations, non-negative costs, no future timestamps).
    /// Intended for tests and debug assertions, not the hot path.
    pub fn check_invariants(&self, now: MillisTime) -> Result<(), &'static str> {
        let own_id = self.own_id();
        let mut seen = [false; crate::identity::MAX_NODES];
        for entry in self.table.entries() {
            if entry.destination == own_id {
                return Err("slot with destination == own_id");
            }
            if entry.destination as usize >= seen.len() {
                continue;
            }
            if seen[entry.destination as usize] {
                return Err("duplicate destination");
            }
            seen[entry.destination as usize] = true;
            if entry.cost < 0 {
                return Err("negative cost");
            }
            if entry.last_updated > now {
                return Err("last_updated is in the future");
            }
        }
        Ok(())
    }
}
