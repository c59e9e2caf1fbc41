//! TOML topology loader for the demonstration binary and integration tests.
//!
//! This is ambient tooling around the routing core: it has no bearing on the
//! routing invariants and exists only to stand up a small simulated mesh
//! without hand-writing RSSI tables in every test.

use std::path::Path;

use serde::Deserialize;

use crate::identity::NodeId;

/// One node's RSSI toward each of its listed neighbors.
#[derive(Debug, Clone, Deserialize)]
pub struct TopologyNode {
    pub id: NodeId,
    /// `(neighbor_id, rssi_dbm)` pairs. The mesh need not be symmetric; list
    /// both directions explicitly if a link is bidirectional.
    pub links: Vec<(NodeId, i16)>,
}

/// A small mesh topology: which nodes exist and their pairwise RSSI.
#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    pub nodes: Vec<TopologyNode>,
}

/// Error surface for [`Topology::load`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read topology file: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to parse topology file: {0}")]
    Parse(#[source] toml::de::Error),
}

impl Topology {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        toml::from_str(&content).map_err(ConfigError::Parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_small_topology() {
        let toml = r#"
            [[nodes]]
            id = 0
            links = [[1, -50]]

            [[nodes]]
            id = 1
            links = [[0, -50], [2, -60]]

            [[nodes]]
            id = 2
            links = [[1, -60]]
        "#;
        let topology: Topology = toml::from_str(toml).unwrap();
        assert_eq!(topology.nodes.len(), 3);
        assert_eq!(topology.nodes[1].links, vec![(0, -50), (2, -60)]);
    }
}
