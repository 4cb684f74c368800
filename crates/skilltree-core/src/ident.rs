// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier types shared across the engine.

/// Catalog node identifier. Synthesized cluster nodes live at and above
/// [`CLUSTER_NODE_BASE`].
pub type NodeId = u32;

/// Identifier of an item in the caller's [`ItemStore`](crate::ItemStore).
pub type ItemId = u64;

/// First id of the private range used by synthesized cluster-jewel nodes.
///
/// A cluster node id is `CLUSTER_NODE_BASE + proxy_group * 16 + slot`, so
/// synthesized nodes never collide with catalog ids.
pub const CLUSTER_NODE_BASE: NodeId = 131_072;

/// Slot reserved for the mastery node of a cluster.
pub(crate) const CLUSTER_MASTERY_SLOT: NodeId = 15;

/// Id of the synthesized node at `slot` of the cluster built on `proxy_group`.
pub(crate) fn cluster_node_id(proxy_group: u32, slot: u32) -> NodeId {
    CLUSTER_NODE_BASE + proxy_group * 16 + slot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_ids_stay_above_base() {
        assert_eq!(cluster_node_id(0, 0), CLUSTER_NODE_BASE);
        assert_eq!(cluster_node_id(3, 5), CLUSTER_NODE_BASE + 53);
        assert_eq!(cluster_node_id(3, CLUSTER_MASTERY_SLOT), CLUSTER_NODE_BASE + 63);
    }
}
