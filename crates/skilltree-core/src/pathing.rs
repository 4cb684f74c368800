// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Path allocation and disconnection sweep.
use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::connectivity::{connected_nodes, has_leap, leap_jewels, Connected, NodeStates};
use crate::history::NodeAction;
use crate::ident::NodeId;
use crate::realize::TreeData;
use crate::state::NodeState;

/// Nodes a user action would add and remove.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeAction {
    /// Nodes to allocate, root side first.
    pub add: Vec<NodeAction>,
    /// Nodes to deallocate.
    pub remove: Vec<NodeId>,
}

impl TreeAction {
    /// Neither adds nor removes anything.
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

fn root_connected(data: &TreeData<'_>, exclude: &[NodeId]) -> Connected {
    let mut connected = Connected::default();
    connected_nodes(data, data, &mut connected, &data.start_nodes(), 0, exclude);
    connected
}

/// Shortest set of nodes that connects `target` to the allocated tree.
///
/// Returns `None` when the target is unknown, already allocated, or cannot be
/// reached. A target covered by a leap jewel is added alone.
pub fn allocate_path(data: &TreeData<'_>, target: NodeId) -> Option<TreeAction> {
    let target_node = data.node(target)?;
    if target_node.state != NodeState::None {
        return None;
    }
    // ascendancy nodes never go into a weapon set
    let active_set = if target_node.skill.ascendancy.is_some() {
        0
    } else {
        data.state().active_set
    };

    let connected = root_connected(data, &[]);
    let skill = &target_node.skill;
    if !skill.is_jewel_socket
        && !skill.is_multiple_choice_option
        && skill.ascendancy.is_none()
        && has_leap(&leap_jewels(data), &connected, &target_node, active_set)
    {
        return Some(TreeAction {
            add: vec![NodeAction::new(target, active_set)],
            remove: Vec::new(),
        });
    }

    let mut parents: FxHashMap<NodeId, Option<NodeId>> = FxHashMap::default();
    parents.insert(target, None);
    let mut queue = VecDeque::from([target]);
    while let Some(id) = queue.pop_front() {
        if connected.contains_key(&id) {
            return Some(walk_back(data, &parents, id, active_set));
        }
        let Some(node) = data.node(id) else { continue };
        for edge in &node.connections {
            let nid = edge.id;
            if parents.contains_key(&nid) {
                continue;
            }
            let Some(next) = data.node(nid) else { continue };
            let inactive = next.state == NodeState::None;
            if (next.skill.is_ascendancy_root || next.skill.is_starting_node()) && inactive {
                continue;
            }
            if node.skill.ascendancy != next.skill.ascendancy && inactive {
                continue;
            }
            if next.skill.is_just_icon {
                continue;
            }
            if next.skill.ascendancy.is_none() && node.skill.ascendancy.is_some() {
                continue;
            }
            // an unallocated multiple-choice node needs one of its options first
            if next.skill.is_multiple_choice && !node.skill.is_multiple_choice_option && inactive {
                continue;
            }
            if next.weapon_set != 0 && next.weapon_set != active_set {
                continue;
            }
            parents.insert(nid, Some(id));
            queue.push_back(nid);
        }
    }
    trace!(node = target, set = active_set, "no path to target");
    None
}

fn walk_back(
    data: &TreeData<'_>,
    parents: &FxHashMap<NodeId, Option<NodeId>>,
    from: NodeId,
    active_set: u8,
) -> TreeAction {
    let mut action = TreeAction::default();
    let mut cursor = Some(from);
    while let Some(id) = cursor {
        let Some(node) = data.node(id) else { break };
        if node.state == NodeState::None {
            action.add.push(NodeAction::new(id, active_set));
        }
        let next = parents.get(&id).copied().flatten();
        if let Some(next) = next {
            let into_option = data
                .node(next)
                .is_some_and(|option| option.skill.is_multiple_choice_option);
            if node.skill.is_multiple_choice && into_option {
                for edge in node.connections.iter().filter(|edge| edge.id != next) {
                    let selected = data.node(edge.id).is_some_and(|sibling| {
                        sibling.skill.is_multiple_choice_option && sibling.state != NodeState::None
                    });
                    if selected {
                        action.remove.push(edge.id);
                    }
                }
            }
        }
        cursor = next;
    }
    action
}

/// Allocated nodes that lose their connection once `removing` is gone.
///
/// The removed ids (when allocated) come first, then every orphaned node not
/// covered by a surviving leap jewel, ascending by id.
pub fn disconnected_nodes(data: &TreeData<'_>, removing: &[NodeId]) -> Vec<NodeId> {
    let connected = root_connected(data, removing);
    let leaps = leap_jewels(data);
    let allocated = data.allocated();

    let mut result: Vec<NodeId> = removing
        .iter()
        .copied()
        .filter(|id| allocated.contains_key(id) && !connected.contains_key(id))
        .collect();
    for (id, packed) in allocated {
        if connected.contains_key(&id) || removing.contains(&id) {
            continue;
        }
        let covered = !leaps.is_empty()
            && data
                .node(id)
                .is_some_and(|node| has_leap(&leaps, &connected, &node, packed.weapon_set()));
        if !covered {
            result.push(id);
        }
    }
    result
}

/// What toggling `id` would do: allocate a path to it, or remove it and
/// everything that depends on it.
pub fn toggle_action(data: &TreeData<'_>, id: NodeId) -> Option<TreeAction> {
    if !data.state().packed(id).is_set() {
        return allocate_path(data, id);
    }
    let node = data.node(id)?;
    let mut removing = vec![id];
    if node.skill.is_multiple_choice_option {
        // an option's first edge leads to its parent
        removing.extend(node.connections.first().map(|edge| edge.id));
    }
    Some(TreeAction {
        add: Vec::new(),
        remove: disconnected_nodes(data, &removing),
    })
}
