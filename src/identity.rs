//! Compile-time node-id <-> MAC directory.
//!
//! The mesh is bounded to ten nodes (ids `0..=9`); the directory mapping ids
//! to hardware addresses is fixed at construction time. There is no dynamic
//! registration — a node absent from the directory is simply never resolved.

use crate::mac::Mac;

pub const MAX_NODES: usize = 10;

/// Small integer identifying a node within the mesh, `0..=9`.
pub type NodeId = u8;

/// Error returned when constructing an [`IdentityTable`] with an invalid id.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("node id {0} is out of range 0..=9")]
    NodeIdOutOfRange(NodeId),
}

/// Fixed directory of `(node_id, mac)` pairs plus this node's own identity.
#[derive(Debug, Clone)]
pub struct IdentityTable {
    own_id: NodeId,
    own_mac: Mac,
    directory: [Option<Mac>; MAX_NODES],
}

impl IdentityTable {
    /// Builds a directory from compiled-in `(id, mac)` pairs. `own_id` must
    /// be present among `directory` entries (it is used to resolve `own_mac`).
    pub fn new(own_id: NodeId, directory: [Option<Mac>; MAX_NODES]) -> Result<Self, IdentityError> {
        if own_id as usize >= MAX_NODES {
            return Err(IdentityError::NodeIdOutOfRange(own_id));
        }
        let own_mac = directory[own_id as usize].unwrap_or_default();
        Ok(Self { own_id, own_mac, directory })
    }

    pub fn own_id(&self) -> NodeId {
        self.own_id
    }

    pub fn own_mac(&self) -> Mac {
        self.own_mac
    }

    /// Looks up the directory entry for `id`. Returns `None` for ids outside
    /// `0..=9` or ids with no compiled-in address.
    pub fn id_to_mac(&self, id: NodeId) -> Option<Mac> {
        self.directory.get(id as usize).copied().flatten()
    }

    /// Linear scan for the node-id owning `mac`. Case sensitivity is not a
    /// concern here since [`Mac`] is already a normalized byte value; the
    /// case-insensitivity called for at the wire boundary is handled by the
    /// codec before a `Mac` is constructed.
    pub fn mac_to_id(&self, mac: Mac) -> Option<NodeId> {
        self.directory
            .iter()
            .position(|entry| *entry == Some(mac))
            .map(|idx| idx as NodeId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac(n: u8) -> Mac {
        Mac::new([0, 0, 0, 0, 0, n])
    }

    fn sample_directory() -> [Option<Mac>; MAX_NODES] {
        let mut dir = [None; MAX_NODES];
        dir[0] = Some(mac(0));
        dir[1] = Some(mac(1));
        dir[2] = Some(mac(2));
        dir
    }

    #[test]
    fn own_mac_resolves_from_directory() {
        let table = IdentityTable::new(1, sample_directory()).unwrap();
        assert_eq!(table.own_mac(), mac(1));
        assert_eq!(table.own_id(), 1);
    }

    #[test]
    fn mac_to_id_scans_directory() {
        let table = IdentityTable::new(0, sample_directory()).unwrap();
        assert_eq!(table.mac_to_id(mac(2)), Some(2));
        assert_eq!(table.mac_to_id(mac(9)), None);
    }

    #[test]
    fn out_of_range_own_id_is_rejected() {
        assert!(matches!(
            IdentityTable::new(10, sample_directory()),
            Err(IdentityError::NodeIdOutOfRange(10))
        ));
    }

    #[test]
    fn id_to_mac_returns_none_for_unpopulated_slot() {
        let table = IdentityTable::new(0, sample_directory()).unwrap();
        assert_eq!(table.id_to_mac(5), None);
    }
}
