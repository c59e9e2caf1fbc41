//! Fixed ten-slot routing table.
//!
//! A small array of plain data with lookup/allocate/evict methods doing
//! first-fit linear scans. At `N = 10` this is cheaper and easier to reason
//! about than anything indexed.

use crate::clock::{elapsed_exceeds, MillisTime};
use crate::identity::{NodeId, MAX_NODES};
use crate::mac::Mac;

/// One destination this node can currently reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    pub destination: NodeId,
    pub mac: Mac,
    pub rssi: i16,
    pub cost: i32,
    pub next_hop_id: NodeId,
    pub next_hop_mac: Mac,
    pub last_updated: MillisTime,
}

/// A table slot: empty, or occupied by one [`RouteEntry`].
#[derive(Debug, Clone, Copy, Default)]
struct Slot(Option<RouteEntry>);

/// Fixed-capacity (ten slots) routing table.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    slots: [Slot; MAX_NODES],
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutingTable {
    pub fn new() -> Self {
        Self { slots: [Slot::default(); MAX_NODES] }
    }

    /// Occupied entries in fixed slot order. Order is an implementation
    /// detail (it affects only the order of entries in serialized
    /// ROUTINGID frames) and is not guaranteed stable across restarts.
    pub fn entries(&self) -> impl Iterator<Item = &RouteEntry> {
        self.slots.iter().filter_map(|slot| slot.0.as_ref())
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut RouteEntry> {
        self.slots.iter_mut().filter_map(|slot| slot.0.as_mut())
    }

    pub fn find_by_destination(&self, destination: NodeId) -> Option<&RouteEntry> {
        self.entries().find(|e| e.destination == destination)
    }

    pub fn find_by_destination_mut(&mut self, destination: NodeId) -> Option<&mut RouteEntry> {
        self.entries_mut().find(|e| e.destination == destination)
    }

    pub fn find_by_mac(&self, mac: Mac) -> Option<&RouteEntry> {
        self.entries().find(|e| e.mac == mac)
    }

    fn first_empty_slot(&mut self) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|slot| slot.0.is_none())
    }

    /// Inserts `entry`, overwriting any existing slot for the same
    /// destination. Returns `false` (entry dropped) if the table is full and
    /// no slot for this destination already exists — an existing route is
    /// never evicted to make room for a new one.
    pub fn upsert(&mut self, entry: RouteEntry) -> bool {
        if let Some(existing) = self.find_by_destination_mut(entry.destination) {
            *existing = entry;
            return true;
        }
        match self.first_empty_slot() {
            Some(slot) => {
                slot.0 = Some(entry);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == MAX_NODES
    }

    /// Clears any occupied slot with `now - last_updated > ttl_ms`. Returns
    /// the destinations that were evicted, for logging by the caller.
    pub fn evict_stale(&mut self, now: MillisTime, ttl_ms: MillisTime) -> Vec<NodeId> {
        let mut evicted = Vec::new();
        for slot in self.slots.iter_mut() {
            if let Some(entry) = slot.0 {
                if elapsed_exceeds(now, entry.last_updated, ttl_ms) {
                    evicted.push(entry.destination);
                    slot.0 = None;
                }
            }
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(dest: NodeId, cost: i32, last_updated: MillisTime) -> RouteEntry {
        RouteEntry {
            destination: dest,
            mac: Mac::new([0, 0, 0, 0, 0, dest]),
            rssi: -cost as i16,
            cost,
            next_hop_id: dest,
            next_hop_mac: Mac::new([0, 0, 0, 0, 0, dest]),
            last_updated,
        }
    }

    #[test]
    fn upsert_then_find_roundtrips() {
        let mut table = RoutingTable::new();
        assert!(table.upsert(entry(3, 50, 0)));
        let found = table.find_by_destination(3).unwrap();
        assert_eq!(found.cost, 50);
    }

    #[test]
    fn upsert_overwrites_existing_destination_without_consuming_a_new_slot() {
        let mut table = RoutingTable::new();
        assert!(table.upsert(entry(3, 50, 0)));
        assert!(table.upsert(entry(3, 10, 100)));
        assert_eq!(table.len(), 1);
        assert_eq!(table.find_by_destination(3).unwrap().cost, 10);
    }

    #[test]
    fn upsert_fails_silently_when_full() {
        let mut table = RoutingTable::new();
        for dest in 0..MAX_NODES as NodeId {
            assert!(table.upsert(entry(dest, 10, 0)));
        }
        assert!(table.is_full());
        // All ten slots are occupied by distinct destinations; a new,
        // eleventh destination has nowhere to go and is silently dropped.
        assert!(!table.upsert(entry(200, 1, 0)));
        assert_eq!(table.len(), MAX_NODES);
    }

    #[test]
    fn evict_stale_clears_only_old_entries() {
        let mut table = RoutingTable::new();
        table.upsert(entry(1, 10, 0));
        table.upsert(entry(2, 10, 50_000));
        let evicted = table.evict_stale(61_000, 60_000);
        assert_eq!(evicted, vec![1]);
        assert!(table.find_by_destination(1).is_none());
        assert!(table.find_by_destination(2).is_some());
    }
}
