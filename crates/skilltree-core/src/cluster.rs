// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Cluster jewel synthesis.
//!
//! A cluster jewel socketed next to a proxy node replaces the proxy's group
//! with a ring of synthesized nodes. Synthesized ids live in the private range
//! starting at [`CLUSTER_NODE_BASE`](crate::CLUSTER_NODE_BASE); the proxy
//! itself keeps its catalog id and takes slot 0.
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::trace;

use crate::catalog::{skill_of, Catalog, ClusterJewelSize, Connection, SkillDefinition, SkillRef};
use crate::ident::{cluster_node_id, NodeId, CLUSTER_MASTERY_SLOT, CLUSTER_NODE_BASE};
use crate::item::Item;
use crate::math::{orbit_arc, polar};
use crate::orbit::{orbit_angle, ORBIT_RADII, SKILLS_PER_ORBIT};
use crate::realize::{GroupView, NodeView, TreeData};
use crate::state::NodeState;
use crate::stats::{stats_extend, stats_scale, Stats};

/// Small-passive skill used when a jewel names none.
const EMPTY_SMALL_SKILL: &str = "affliction_empty_node_";

/// Nested clusters deeper than this are not synthesized.
const MAX_CLUSTER_DEPTH: u32 = 4;

/// What a cluster jewel contributes, derived from its base and stats.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterData {
    /// Passive count.
    pub nodes: u32,
    /// Socket count.
    pub sockets: u32,
    /// Notables in grant order.
    pub notables: Vec<String>,
    /// Small-passive skill id.
    pub skill: String,
    /// Mastery skill id.
    pub mastery: Option<String>,
    /// Stats of every small passive.
    pub stats: Stats,
}

/// Cluster parameters of `item`, or `None` when its base is not a cluster jewel.
pub fn cluster_data(item: &Item, catalog: &Catalog) -> Option<ClusterData> {
    let base = catalog.item_bases.get(&item.base)?.cluster_jewel.as_ref()?;
    let mut data = ClusterData {
        nodes: 0,
        sockets: 0,
        notables: Vec::new(),
        skill: EMPTY_SMALL_SKILL.to_owned(),
        mastery: None,
        stats: Stats::new(),
    };
    if let (None, Some(roll)) = (&item.unique, &item.cluster_jewel) {
        data.nodes = roll.nodes;
        let chosen = base
            .passive_skills
            .iter()
            .find(|skill| skill.id == roll.skill)
            .and_then(|skill| Some((skill, catalog.passive_skills.get(&skill.id)?)));
        if let Some((skill, definition)) = chosen {
            data.skill.clone_from(&skill.id);
            data.mastery.clone_from(&skill.mastery);
            stats_extend(&mut data.stats, [&definition.stats]);
        }
        data.sockets = match base.size {
            ClusterJewelSize::Large => 2,
            ClusterJewelSize::Medium => 1,
            ClusterJewelSize::Small => 0,
        };
    }

    let stats = item.merged_stats();
    let stat = |id: &str| stats.get(id).copied().filter(|value| *value != 0.0);
    data.notables = catalog
        .cluster_jewel_notables
        .iter()
        .filter(|notable| stat(&notable.jewel_stat).is_some())
        .map(|notable| notable.id.clone())
        .collect();
    for (id, granted) in &catalog.affliction_stats {
        if let Some(value) = stat(id) {
            *data.stats.entry(granted.clone()).or_insert(0.0) += value;
        }
    }
    if let Some(count) = stat("local_jewel_expansion_passive_node_count") {
        data.nodes = count as u32;
    }
    if let Some(count) = stat("local_jewel_expansion_jewels_count_override") {
        data.sockets = count as u32;
    }
    data.nodes = data.nodes.max(data.sockets + data.notables.len() as u32);
    if let Some(extra) = stat("local_unique_jewel_grants_x_empty_passives") {
        data.nodes += extra as u32;
    }
    if let Some(effect) = stat("local_affliction_jewel_small_nodes_have_effect_+%") {
        data.stats = stats_scale(&data.stats, 1.0 + 0.01 * effect);
    }
    Some(data)
}

/// Every synthesized node and group of one snapshot.
#[derive(Debug, Clone, Default)]
pub struct ClusterLayout<'a> {
    /// Synthesized nodes, including the proxies they replace.
    pub nodes: BTreeMap<NodeId, Rc<NodeView<'a>>>,
    /// Proxy groups rebuilt as cluster rings.
    pub groups: BTreeMap<u32, Rc<GroupView>>,
}

impl<'a> ClusterLayout<'a> {
    /// Synthesizes clusters for every jewel socketed next to a proxy node.
    pub fn build(data: &TreeData<'a>) -> Self {
        let mut builder = Builder {
            data,
            nodes: BTreeMap::new(),
            groups: BTreeMap::new(),
        };
        for &socket in data.state().jewels.keys() {
            if socket >= CLUSTER_NODE_BASE {
                continue;
            }
            if let Some(proxy) = builder.proxy_for(socket) {
                builder.create(socket, proxy, 0);
            }
        }
        Self {
            nodes: builder
                .nodes
                .into_iter()
                .map(|(id, node)| (id, Rc::new(node)))
                .collect(),
            groups: builder.groups,
        }
    }
}

struct Builder<'d, 'a> {
    data: &'d TreeData<'a>,
    nodes: BTreeMap<NodeId, NodeView<'a>>,
    groups: BTreeMap<u32, Rc<GroupView>>,
}

impl Builder<'_, '_> {
    /// Proxy node reached from `id` across a group boundary.
    fn proxy_for(&self, id: NodeId) -> Option<NodeId> {
        let access = self.data.access();
        let node = access.tree.nodes.get(&id)?;
        node.connections.iter().map(|edge| edge.id).find(|&next_id| {
            access.tree.nodes.get(&next_id).is_some_and(|next| {
                next.parent != node.parent
                    && skill_of(next, access.skills).is_some_and(|skill| skill.is_proxy)
            })
        })
    }

    /// Socket whose skill fits a jewel of `size`, following proxies inward.
    fn downgrade_socket(&self, id: NodeId, size: ClusterJewelSize, depth: u32) -> NodeId {
        let access = self.data.access();
        let Some(node) = access.tree.nodes.get(&id) else { return id };
        let SkillRef::Id { skill_id } = &node.skill else { return id };
        let Some(slot) = self.data.catalog().jewel_slots.get(skill_id) else { return id };
        if slot.size == ClusterJewelSize::Small && size != ClusterJewelSize::Small {
            return id;
        }
        if slot.size != ClusterJewelSize::Large && size == ClusterJewelSize::Large {
            return id;
        }
        if depth >= MAX_CLUSTER_DEPTH {
            return id;
        }
        let Some(proxy) = self.proxy_for(id) else { return id };
        let Some(proxy_node) = access.tree.nodes.get(&proxy) else { return id };
        let inner = proxy_node.connections.iter().find(|edge| {
            access
                .tree
                .nodes
                .get(&edge.id)
                .is_some_and(|next| next.parent == proxy_node.parent)
        });
        match inner {
            Some(edge) => self.downgrade_socket(edge.id, size, depth + 1),
            None => id,
        }
    }

    /// Builds the cluster of the jewel in `socket` on the ring of `proxy`.
    fn create(&mut self, socket: NodeId, proxy: NodeId, depth: u32) -> bool {
        if depth > MAX_CLUSTER_DEPTH {
            return false;
        }
        let data = self.data;
        let catalog = data.catalog();
        let access = data.access();
        let state = data.state();

        let Some(jewel) = state.jewels.get(&socket).and_then(|&item| data.item(item)) else {
            return false;
        };
        let Some(cluster) = cluster_data(jewel, catalog).filter(|cluster| cluster.nodes > 0) else {
            return false;
        };
        let Some(base) = catalog
            .item_bases
            .get(&jewel.base)
            .and_then(|base| base.cluster_jewel.as_ref())
        else {
            return false;
        };
        let Some(proxy_node) = access.tree.nodes.get(&proxy) else { return false };
        let Some(proxy_group) = access.tree.groups.get(&proxy_node.parent) else {
            return false;
        };

        let orbit = match base.size {
            ClusterJewelSize::Large => 3,
            ClusterJewelSize::Medium => 2,
            ClusterJewelSize::Small if cluster.nodes > 1 => 1,
            ClusterJewelSize::Small => 0,
        };
        let group = Rc::new(GroupView {
            id: proxy_node.parent,
            x: proxy_group.x,
            y: proxy_group.y,
            ascendancy: None,
            proxy: true,
            bg: Some(orbit),
            nodes: Vec::new(),
        });
        self.groups.insert(proxy_node.parent, Rc::clone(&group));

        let start = SKILLS_PER_ORBIT
            .get(proxy_node.radius)
            .map_or(0.0, |&size| orbit_angle(size, proxy_node.position));
        let slot_id = |index: u32| {
            if index == 0 {
                proxy
            } else {
                cluster_node_id(proxy_node.parent, index)
            }
        };

        let mut indices: Vec<u32> = base
            .small_indices
            .iter()
            .take(cluster.nodes as usize)
            .copied()
            .collect();
        indices.sort_unstable();
        let sockets: Vec<u32> = base
            .socket_indices
            .iter()
            .copied()
            .filter(|index| indices.contains(index))
            .take(cluster.sockets as usize)
            .collect();
        let mut notables: Vec<u32> = base
            .notable_indices
            .iter()
            .copied()
            .filter(|index| *index != 0 && indices.contains(index) && !sockets.contains(index))
            .take(cluster.notables.len())
            .collect();
        while notables.len() < cluster.notables.len() {
            let spare = indices
                .iter()
                .copied()
                .find(|index| *index != 0 && !sockets.contains(index) && !notables.contains(index));
            match spare {
                Some(index) => notables.push(index),
                None => break,
            }
        }
        if notables.len() < cluster.notables.len() {
            if indices.contains(&0) && !sockets.contains(&0) && !notables.contains(&0) {
                trace!(socket, wanted = cluster.notables.len(), "cluster notable takes the proxy slot");
                notables.push(0);
            } else {
                trace!(
                    socket,
                    dropped = cluster.notables.len() - notables.len(),
                    "no free cluster slot; notables dropped"
                );
            }
        }

        let small_skill = Rc::new(SkillDefinition {
            stats: cluster.stats.clone(),
            ..access.skills.get(&cluster.skill).cloned().unwrap_or_default()
        });
        let radius = ORBIT_RADII[orbit];
        let total = base.total_indices.max(1);
        let mut notable_pos = 0;

        for &index in &indices {
            let mut angle = (start + 360.0 * f64::from(index) / f64::from(total)) % 360.0;
            match base.size {
                ClusterJewelSize::Medium => {
                    if index == 4 && !indices.contains(&2) {
                        angle = (start + 90.0) % 360.0;
                    }
                    if index == 8 && !indices.contains(&10) {
                        angle = (start + 270.0) % 360.0;
                    }
                }
                ClusterJewelSize::Small => {
                    if proxy_group.bg == Some(3) {
                        angle = (angle + 30.0) % 360.0;
                    }
                    if proxy_group.bg == Some(2) {
                        angle = (angle + 330.0) % 360.0;
                    }
                }
                ClusterJewelSize::Large => {}
            }
            let arc = orbit_arc(angle);
            let (dx, dy) = polar(radius, arc);
            let node_id = slot_id(index);
            let packed = state.packed(node_id);
            let mut view = NodeView {
                id: node_id,
                group: Rc::clone(&group),
                x: group.x + dx,
                y: group.y + dy,
                radius,
                arc,
                connections: Vec::new(),
                cluster_node: true,
                skill_id: cluster.skill.clone(),
                skill: Rc::clone(&small_skill),
                state: packed.state(),
                weapon_set: packed.weapon_set(),
                active: packed.state().is_contributing(),
                immutable: false,
                mastery_index: None,
                jewel: None,
            };

            if sockets.contains(&index) {
                let base_socket = proxy_group.nodes.iter().copied().find(|id| {
                    access.tree.nodes.get(id).is_some_and(|node| {
                        SKILLS_PER_ORBIT
                            .get(node.radius)
                            .is_some_and(|&size| orbit_angle(size, node.position) == angle)
                    })
                });
                if let Some(base_socket) = base_socket {
                    let socket_id = self.downgrade_socket(base_socket, base.size, 0);
                    if let Some(socket_node) = access.tree.nodes.get(&socket_id) {
                        view.skill_id = socket_node.skill_key(socket_id);
                        if let Some(skill) = skill_of(socket_node, access.skills) {
                            view.skill = Rc::new(skill.clone());
                        }
                    }
                    if let Some(nested) = self.proxy_for(base_socket) {
                        if self.create(node_id, nested, depth + 1) {
                            view.connections.push(Connection::to(nested));
                        }
                    }
                    view.jewel = state.jewels.get(&node_id).and_then(|&item| data.item(item));
                } else {
                    trace!(socket, slot = index, "no catalog socket at cluster slot angle");
                }
            } else if notables.contains(&index) {
                if let Some(notable) = cluster.notables.get(notable_pos) {
                    notable_pos += 1;
                    view.skill_id.clone_from(notable);
                    if let Some(skill) = access.skills.get(notable) {
                        view.skill = Rc::new(skill.clone());
                    }
                }
            }
            self.nodes.insert(node_id, view);
        }

        self.link(proxy, socket);
        let chain: Vec<NodeId> = indices
            .iter()
            .map(|&index| slot_id(index))
            .chain(std::iter::once(proxy))
            .collect();
        for pair in chain.windows(2) {
            self.link(pair[0], pair[1]);
            self.link(pair[1], pair[0]);
        }

        if let Some((mastery_id, mastery)) = cluster
            .mastery
            .as_ref()
            .and_then(|id| Some((id, access.skills.get(id)?)))
        {
            let id = cluster_node_id(proxy_node.parent, CLUSTER_MASTERY_SLOT);
            self.nodes.insert(
                id,
                NodeView {
                    id,
                    group: Rc::clone(&group),
                    x: group.x,
                    y: group.y,
                    radius: 0.0,
                    arc: 0.0,
                    connections: Vec::new(),
                    cluster_node: true,
                    skill_id: mastery_id.clone(),
                    skill: Rc::new(mastery.clone()),
                    state: NodeState::None,
                    weapon_set: 0,
                    active: false,
                    immutable: true,
                    mastery_index: None,
                    jewel: None,
                },
            );
        }
        true
    }

    fn link(&mut self, from: NodeId, to: NodeId) {
        if let Some(node) = self.nodes.get_mut(&from) {
            node.connections.push(Connection::to(to));
        }
    }
}
