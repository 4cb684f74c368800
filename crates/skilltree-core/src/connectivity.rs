// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Breadth-first reachability over allocated nodes.
use std::collections::{BTreeMap, VecDeque};

use rustc_hash::FxHashMap;

use crate::ident::NodeId;
use crate::radius::{radius_jewel, RadiusJewel};
use crate::realize::{NodeView, TreeData};
use crate::state::{NodeState, PackedState};

/// Reached node → weapon set it was reached at.
pub type Connected = FxHashMap<NodeId, u8>;

/// Source of per-node allocation state.
///
/// [`TreeData`] answers from its snapshot; history validation layers a
/// simulation on top of it.
pub trait NodeStates {
    /// Packed state of a realized node, `None` when the node does not resolve.
    fn node_state(&self, id: NodeId) -> Option<PackedState>;

    /// Every non-empty entry of the underlying state map, ascending by id.
    fn allocated(&self) -> BTreeMap<NodeId, PackedState>;
}

/// Extends `connected` with every node reachable from `queue`.
///
/// Seeds are recorded at `set`. Traversal only enters allocated nodes, never
/// leaves an icon-only node, never crosses from a weapon-set node into a
/// different weapon set, and never steps from a non-ascendancy node into an
/// ascendancy node. Ids in `exclude` are treated as unallocated.
pub fn connected_nodes<S>(
    data: &TreeData<'_>,
    states: &S,
    connected: &mut Connected,
    queue: &[NodeId],
    set: u8,
    exclude: &[NodeId],
) where
    S: NodeStates + ?Sized,
{
    for &id in queue {
        connected.insert(id, set);
    }
    let mut queue: VecDeque<NodeId> = queue.iter().copied().collect();
    while let Some(id) = queue.pop_front() {
        let Some(node) = data.node(id) else { continue };
        let current = states.node_state(id).unwrap_or_default();
        for edge in &node.connections {
            let nid = edge.id;
            if connected.contains_key(&nid) || exclude.contains(&nid) {
                continue;
            }
            let Some(next) = data.node(nid) else { continue };
            let Some(next_state) = states.node_state(nid) else { continue };
            if next_state.state() == NodeState::None {
                continue;
            }
            if current.weapon_set() != 0 && current.weapon_set() != next_state.weapon_set() {
                continue;
            }
            if node.skill.is_just_icon {
                continue;
            }
            if next.skill.ascendancy.is_some() && node.skill.ascendancy.is_none() {
                continue;
            }
            connected.insert(nid, next_state.weapon_set());
            queue.push_back(nid);
        }
    }
}

/// Socketed jewels that grant leap connectivity.
pub fn leap_jewels<'a>(data: &TreeData<'a>) -> Vec<RadiusJewel<'a>> {
    data.state()
        .jewels
        .keys()
        .filter_map(|&id| radius_jewel(data, id, true))
        .collect()
}

/// Whether `node` is covered by a leap jewel whose socket is connected in
/// weapon set 0 or `set`.
pub fn has_leap(leaps: &[RadiusJewel<'_>], connected: &Connected, node: &NodeView<'_>, set: u8) -> bool {
    leaps.iter().any(|leap| match connected.get(&leap.id) {
        Some(&socket_set) => (socket_set == 0 || socket_set == set) && leap.contains(node),
        None => false,
    })
}
