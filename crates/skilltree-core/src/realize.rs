// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph realization: raw catalog nodes resolved against one snapshot.
//!
//! A [`TreeData`] borrows a catalog, a [`TreeViewState`] and an item store and
//! memoises every derived view for its own lifetime. Build a new instance for
//! every distinct (state, items) pair; nothing is shared between instances.
use std::cell::{OnceCell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::catalog::{skill_of, Catalog, CatalogError, Connection, SkillDefinition, TreeAccess};
use crate::cluster::ClusterLayout;
use crate::connectivity::NodeStates;
use crate::ident::{ItemId, NodeId, CLUSTER_NODE_BASE};
use crate::item::{Item, ItemStore};
use crate::math::{orbit_arc, polar};
use crate::mutation::{calculate_jewel_stats, mutate_tree_skill};
use crate::orbit::{orbit_angle, orbit_position, ORBIT_RADII, SKILLS_PER_ORBIT};
use crate::radius::{radius_jewel, RadiusJewel};
use crate::state::{NodeState, PackedState, TreeVariant, TreeViewState};
use crate::stats::{stats_extend, stats_scale, Stats};

/// Skills an attribute node can be switched to, by attribute index.
pub const ATTRIBUTE_SKILLS: [&str; 3] = [
    "generic_attribute_strength",
    "generic_attribute_dexterity",
    "generic_attribute_intelligence_",
];

const ASCENDANCY_ORBIT: usize = 9;

/// Realized orbit group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupView {
    /// Group id.
    pub id: u32,
    /// Center x (ascendancy groups already translated).
    pub x: f64,
    /// Center y.
    pub y: f64,
    /// Ascendancy tag.
    pub ascendancy: Option<String>,
    /// Cluster proxy group.
    pub proxy: bool,
    /// Background orbit size.
    pub bg: Option<usize>,
    /// Member nodes.
    pub nodes: Vec<NodeId>,
}

/// Realized node: position, resolved skill and snapshot state.
#[derive(Debug, Clone)]
pub struct NodeView<'a> {
    /// Node id.
    pub id: NodeId,
    /// Owning group.
    pub group: Rc<GroupView>,
    /// Absolute x.
    pub x: f64,
    /// Absolute y.
    pub y: f64,
    /// Orbit radius.
    pub radius: f64,
    /// Angular position in radians.
    pub arc: f64,
    /// Neighbours.
    pub connections: Vec<Connection>,
    /// Synthesized by a cluster jewel.
    pub cluster_node: bool,
    /// Key of the catalog skill.
    pub skill_id: String,
    /// Catalog skill before jewel effects.
    pub skill: Rc<SkillDefinition>,
    /// State part of the packed state.
    pub state: NodeState,
    /// Weapon-set part of the packed state.
    pub weapon_set: u8,
    /// Contributing state.
    pub active: bool,
    /// Derived purely from class and ascendancy selection.
    pub immutable: bool,
    /// Selected mastery effect.
    pub mastery_index: Option<u32>,
    /// Socketed item.
    pub jewel: Option<&'a Item>,
}

impl NodeView<'_> {
    /// Packed form of `state` and `weapon_set`.
    pub fn packed(&self) -> PackedState {
        PackedState::new(self.state, self.weapon_set)
    }
}

/// Aggregate stats of every active node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TotalStats {
    /// Stats of non-keystone nodes.
    pub stats: Stats,
    /// Aura stats.
    pub aura_stats: Stats,
    /// Allocated keystones.
    pub keystones: Vec<NodeId>,
}

/// Memoising realization of one snapshot.
pub struct TreeData<'a> {
    catalog: &'a Catalog,
    state: &'a TreeViewState,
    items: &'a dyn ItemStore,
    access: TreeAccess<'a>,
    nodes: RefCell<FxHashMap<NodeId, Option<Rc<NodeView<'a>>>>>,
    groups: RefCell<FxHashMap<u32, Option<Rc<GroupView>>>>,
    skills: RefCell<FxHashMap<NodeId, Option<Rc<SkillDefinition>>>>,
    masteries: RefCell<FxHashMap<String, Vec<u32>>>,
    cluster: OnceCell<ClusterLayout<'a>>,
    keystone_stats: OnceCell<Stats>,
    total_stats: OnceCell<TotalStats>,
    radius_jewels: OnceCell<Vec<RadiusJewel<'a>>>,
}

impl std::fmt::Debug for TreeData<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeData")
            .field("version", &self.state.version)
            .field("variant", &self.state.variant)
            .field("cached_nodes", &self.nodes.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<'a> TreeData<'a> {
    /// Realization of `state` against `catalog` and `items`.
    pub fn new(
        catalog: &'a Catalog,
        state: &'a TreeViewState,
        items: &'a dyn ItemStore,
    ) -> Result<Self, CatalogError> {
        let access = catalog.tree(state.version, state.variant.is_atlas())?;
        Ok(Self {
            catalog,
            state,
            items,
            access,
            nodes: RefCell::default(),
            groups: RefCell::default(),
            skills: RefCell::default(),
            masteries: RefCell::default(),
            cluster: OnceCell::new(),
            keystone_stats: OnceCell::new(),
            total_stats: OnceCell::new(),
            radius_jewels: OnceCell::new(),
        })
    }

    /// Catalog this snapshot resolves against.
    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// The snapshot.
    pub fn state(&self) -> &'a TreeViewState {
        self.state
    }

    /// Selected tree and skill table.
    pub fn access(&self) -> TreeAccess<'a> {
        self.access
    }

    /// Item lookup.
    pub fn item(&self, id: ItemId) -> Option<&'a Item> {
        self.items.item(id)
    }

    /// Atlas snapshot.
    pub fn is_atlas(&self) -> bool {
        self.state.variant.is_atlas()
    }

    fn use_ascendancy(&self, ascendancy: Option<&str>) -> bool {
        match &self.state.variant {
            TreeVariant::Atlas(_) => true,
            TreeVariant::Passive(config) if config.ascendancy_only => {
                ascendancy == config.ascendancy.as_deref()
            }
            TreeVariant::Passive(config) => {
                ascendancy.is_none() || ascendancy == config.ascendancy.as_deref()
            }
        }
    }

    fn cluster(&self) -> &ClusterLayout<'a> {
        self.cluster.get_or_init(|| ClusterLayout::build(self))
    }

    /// Realized group, or `None` when filtered out or unknown.
    pub fn group(&self, id: u32) -> Option<Rc<GroupView>> {
        if let Some(cached) = self.groups.borrow().get(&id) {
            return cached.clone();
        }
        let view = self.realize_group(id);
        self.groups.borrow_mut().insert(id, view.clone());
        view
    }

    fn realize_group(&self, id: u32) -> Option<Rc<GroupView>> {
        let tree = self.access.tree;
        let group = tree.groups.get(&id)?;
        if group.proxy {
            return self.cluster().groups.get(&id).cloned();
        }
        if !self.use_ascendancy(group.ascendancy.as_deref()) {
            return None;
        }
        let mut view = GroupView {
            id,
            x: group.x,
            y: group.y,
            ascendancy: group.ascendancy.clone(),
            proxy: group.proxy,
            bg: group.bg,
            nodes: group.nodes.clone(),
        };
        let root = group
            .ascendancy
            .as_ref()
            .and_then(|ascendancy| tree.ascendancy_root.get(ascendancy))
            .and_then(|root| tree.nodes.get(root));
        if let (Some(root), TreeVariant::Passive(_)) = (root, &self.state.variant) {
            let (mut cx, mut cy) = (0.0, 0.0);
            if root.radius != ASCENDANCY_ORBIT {
                let size = SKILLS_PER_ORBIT.get(root.radius).copied().unwrap_or(1);
                let arc = orbit_arc(orbit_angle(size, root.position));
                let inner = ORBIT_RADII.get(root.radius).copied().unwrap_or(0.0);
                (cx, cy) = polar(ORBIT_RADII[ASCENDANCY_ORBIT] - inner, arc);
            }
            if let Some(root_group) = tree.groups.get(&root.parent) {
                view.x += cx - root_group.x;
                view.y += cy - root_group.y;
            }
        }
        Some(Rc::new(view))
    }

    /// Realized node, or `None` when unknown or filtered out.
    pub fn node(&self, id: NodeId) -> Option<Rc<NodeView<'a>>> {
        if let Some(cached) = self.nodes.borrow().get(&id) {
            return cached.clone();
        }
        let view = self.realize_node(id);
        self.nodes.borrow_mut().insert(id, view.clone());
        view
    }

    fn realize_node(&self, id: NodeId) -> Option<Rc<NodeView<'a>>> {
        if id > CLUSTER_NODE_BASE {
            return self.cluster().nodes.get(&id).cloned();
        }
        let tree = self.access.tree;
        let node = tree.nodes.get(&id)?;
        let group = self.group(node.parent)?;
        if group.proxy {
            return self.cluster().nodes.get(&id).cloned();
        }
        let skill = skill_of(node, self.access.skills)?;
        if !self.use_ascendancy(skill.ascendancy.as_deref()) {
            return None;
        }
        if skill.is_anointment_only && !self.state.show_hidden_nodes {
            return None;
        }
        let point = orbit_position((group.x, group.y), node.radius, node.position)?;

        let packed = self.state.packed(id);
        let (state, immutable) = match &self.state.variant {
            TreeVariant::Atlas(_) if tree.root_passives.contains(&id) => (NodeState::Active, true),
            TreeVariant::Atlas(_) => (packed.state(), false),
            TreeVariant::Passive(config) => {
                if skill.is_starting_node() {
                    let own = skill.starting_node.contains(&config.char_class);
                    (if own { NodeState::Active } else { NodeState::None }, true)
                } else if skill.is_ascendancy_root {
                    let own = skill.ascendancy.is_some() && skill.ascendancy == config.ascendancy;
                    (if own { NodeState::Active } else { NodeState::None }, true)
                } else {
                    (packed.state(), skill.is_just_icon)
                }
            }
        };
        let active = state.is_contributing();

        let mastery_index = if skill.mastery.is_some() && active {
            self.state.masteries.get(&id).copied()
        } else {
            None
        };
        let jewel = if skill.is_jewel_socket {
            self.state.jewels.get(&id).and_then(|&item| self.items.item(item))
        } else {
            None
        };

        Some(Rc::new(NodeView {
            id,
            group,
            x: point.x,
            y: point.y,
            radius: point.radius,
            arc: point.arc,
            connections: node.connections.clone(),
            cluster_node: false,
            skill_id: node.skill_key(id),
            skill: Rc::new(skill.clone()),
            state,
            weapon_set: packed.weapon_set(),
            active,
            immutable,
            mastery_index,
            jewel,
        }))
    }

    /// Effective skill of a node after attribute choice, jewel and keystone effects.
    pub fn node_skill(&self, id: NodeId) -> Option<Rc<SkillDefinition>> {
        if let Some(cached) = self.skills.borrow().get(&id) {
            return cached.clone();
        }
        let skill = self.resolve_skill(id);
        self.skills.borrow_mut().insert(id, skill.clone());
        skill
    }

    fn resolve_skill(&self, id: NodeId) -> Option<Rc<SkillDefinition>> {
        let node = self.node(id)?;
        let skill = &node.skill;

        if self.is_atlas() {
            if skill.is_keystone {
                return Some(Rc::clone(skill));
            }
            let keystones = self.keystone_stats();
            let flag = |stat: &str| keystones.get(stat).is_some_and(|v| *v != 0.0);
            if skill.is_notable {
                if flag("display_notable_atlas_passives_grant_nothing") {
                    return Some(Rc::new(skill.emptied()));
                }
            } else {
                if flag("display_small_atlas_passives_grant_nothing") {
                    return Some(Rc::new(skill.emptied()));
                }
                if let Some(bonus) = keystones
                    .get("small_atlas_passive_effect_+%")
                    .filter(|v| **v != 0.0)
                {
                    return Some(Rc::new(SkillDefinition {
                        stats: stats_scale(&skill.stats, 1.0 + 0.01 * bonus),
                        ..(**skill).clone()
                    }));
                }
            }
            return Some(Rc::clone(skill));
        }

        if !node.immutable && !skill.is_jewel_socket && skill.mastery.is_none() && !node.cluster_node
        {
            let mut base: &SkillDefinition = skill;
            let switchable = skill
                .stats
                .get("display_passive_attribute_text")
                .is_some_and(|v| *v != 0.0);
            if switchable && node.active {
                if let Some(choice) = self
                    .state
                    .attributes
                    .get(&id)
                    .and_then(|&index| ATTRIBUTE_SKILLS.get(index))
                    .and_then(|key| self.access.skills.get(*key))
                {
                    base = choice;
                }
            }
            let jewels: Vec<&Item> = self
                .radius_jewels()
                .iter()
                .filter(|radius| radius.contains(&node))
                .map(|radius| radius.jewel)
                .collect();
            if jewels.is_empty() && std::ptr::eq(base, &**skill) {
                return Some(Rc::clone(skill));
            }
            let mutated = mutate_tree_skill(self.catalog, id, node.active, base, skill, &jewels);
            return Some(Rc::new(mutated));
        }

        if skill.is_jewel_socket && node.jewel.is_some() && node.active {
            return Some(Rc::new(SkillDefinition {
                stats: calculate_jewel_stats(self, id),
                ..(**skill).clone()
            }));
        }

        Some(Rc::clone(skill))
    }

    fn keystone_stats(&self) -> &Stats {
        self.keystone_stats.get_or_init(|| {
            let mut stats = Stats::new();
            for id in self.active_nodes() {
                let Some(node) = self.node(id) else { continue };
                if node.skill.is_keystone {
                    stats_extend(&mut stats, [&node.skill.stats]);
                } else if node.skill.is_wormhole {
                    *stats.entry("wormhole_count".to_owned()).or_insert(0.0) += 1.0;
                }
            }
            stats
        })
    }

    /// Aggregate stats of all active nodes.
    pub fn total_stats(&self) -> &TotalStats {
        self.total_stats.get_or_init(|| {
            let mut total = TotalStats::default();
            let mut notables = 0.0;
            for id in self.active_nodes() {
                let Some(skill) = self.node_skill(id) else { continue };
                if skill.disabled {
                    continue;
                }
                if skill.is_keystone {
                    total.keystones.push(id);
                } else {
                    stats_extend(&mut total.stats, [&skill.stats]);
                    if let Some(aura) = &skill.aura {
                        stats_extend(&mut total.aura_stats, [&aura.stats]);
                    }
                }
                if skill.is_notable {
                    notables += 1.0;
                }
            }
            if self.is_atlas() {
                let bonus = self
                    .keystone_stats()
                    .get("map_pack_size_+%_per_atlas_notable_passive_allocated")
                    .copied()
                    .unwrap_or(0.0);
                if bonus != 0.0 {
                    *total
                        .stats
                        .entry("map_pack_size_+%".to_owned())
                        .or_insert(0.0) += bonus * notables;
                }
            }
            total
        })
    }

    /// Mastery indices selected on active nodes whose mastery counts `stat`.
    pub fn active_masteries(&self, stat: &str) -> Vec<u32> {
        if let Some(cached) = self.masteries.borrow().get(stat) {
            return cached.clone();
        }
        let indices: Vec<u32> = self
            .active_nodes()
            .into_iter()
            .filter_map(|id| self.node(id))
            .filter(|node| {
                node.skill
                    .mastery
                    .as_ref()
                    .is_some_and(|mastery| mastery.count_stat == stat)
            })
            .filter_map(|node| node.mastery_index)
            .collect();
        self.masteries
            .borrow_mut()
            .insert(stat.to_owned(), indices.clone());
        indices
    }

    /// Radius jewels in contributing sockets.
    pub fn radius_jewels(&self) -> &[RadiusJewel<'a>] {
        self.radius_jewels.get_or_init(|| {
            self.state
                .jewels
                .iter()
                .filter(|(_, &item)| self.items.item(item).is_some())
                .filter(|(&id, _)| self.state.packed(id).state().is_contributing())
                .filter_map(|(&id, _)| radius_jewel(self, id, false))
                .collect()
        })
    }

    /// Roots: class start then ascendancy root, or the atlas root passives.
    pub fn start_nodes(&self) -> Vec<NodeId> {
        let tree = self.access.tree;
        match &self.state.variant {
            TreeVariant::Atlas(_) => tree.root_passives.clone(),
            TreeVariant::Passive(config) => {
                let mut roots = Vec::with_capacity(2);
                if !config.ascendancy_only {
                    roots.extend(tree.character_root.get(&config.char_class).copied());
                }
                if let Some(ascendancy) = &config.ascendancy {
                    roots.extend(tree.ascendancy_root.get(ascendancy).copied());
                }
                roots
            }
        }
    }

    /// Every visible node: catalog order, then synthesized cluster nodes.
    pub fn all_nodes(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .access
            .tree
            .nodes
            .keys()
            .copied()
            .filter(|&id| self.node(id).is_some())
            .collect();
        ids.extend(
            self.cluster()
                .nodes
                .keys()
                .copied()
                .filter(|&id| id > CLUSTER_NODE_BASE),
        );
        ids
    }

    /// Roots first, then every contributing node in id order.
    pub fn active_nodes(&self) -> Vec<NodeId> {
        let mut ids = self.start_nodes();
        ids.extend(
            self.state
                .nodes
                .iter()
                .filter(|(_, packed)| packed.state().is_contributing())
                .map(|(&id, _)| id)
                .filter(|&id| self.node(id).is_some()),
        );
        ids
    }

    /// Catalog nodes inside `radius`, excluding its anchor socket.
    pub fn nodes_in_radius(&self, radius: &RadiusJewel<'_>) -> Vec<NodeId> {
        self.access
            .tree
            .nodes
            .keys()
            .copied()
            .filter(|&id| id != radius.id)
            .filter(|&id| self.node(id).is_some_and(|node| radius.contains(&node)))
            .collect()
    }

    /// Raw non-empty entries of the snapshot's state map.
    pub(crate) fn raw_states(&self) -> BTreeMap<NodeId, PackedState> {
        self.state
            .nodes
            .iter()
            .filter(|(_, packed)| packed.is_set())
            .map(|(&id, &packed)| (id, packed))
            .collect()
    }
}

impl NodeStates for TreeData<'_> {
    fn node_state(&self, id: NodeId) -> Option<PackedState> {
        self.node(id).map(|node| node.packed())
    }

    fn allocated(&self) -> BTreeMap<NodeId, PackedState> {
        self.raw_states()
    }
}
