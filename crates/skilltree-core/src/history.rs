// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! History engine: replay, validation, append and navigation.
//!
//! A build is an ordered log of [`HistoryStep`]s. Replaying the prefix up to
//! the cursor yields the authoritative [`TreeViewState`]; every edit is
//! re-validated by simulating the whole log against the live graph, so a log
//! that survives an edit always replays to a connected tree within budget.
use std::collections::BTreeMap;

use regex::RegexBuilder;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::catalog::{Catalog, CatalogError, SkillDefinition, TreeAccess};
use crate::connectivity::{connected_nodes, has_leap, leap_jewels, Connected, NodeStates};
use crate::ident::NodeId;
use crate::item::ItemStore;
use crate::pathing::toggle_action;
use crate::radius::{radius_jewel, RadiusJewel};
use crate::realize::TreeData;
use crate::state::{
    check_limit, NodeCount, NodeState, PackedState, TreeEditingState, TreeProperties,
    TreeViewState,
};

/// One node in an add list: bare id (weapon set 0) or id tagged with a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeAction {
    /// Untagged allocation.
    Id(NodeId),
    /// Allocation into a weapon set.
    Tagged {
        /// Node id.
        id: NodeId,
        /// Weapon set.
        set: u8,
    },
}

impl NodeAction {
    /// Canonical form: set 0 is written as a bare id.
    pub const fn new(id: NodeId, set: u8) -> Self {
        if set == 0 {
            Self::Id(id)
        } else {
            Self::Tagged { id, set }
        }
    }

    /// Node id.
    pub const fn id(self) -> NodeId {
        match self {
            Self::Id(id) | Self::Tagged { id, .. } => id,
        }
    }

    /// Weapon set (0 for a bare id).
    pub const fn set(self) -> u8 {
        match self {
            Self::Id(_) => 0,
            Self::Tagged { set, .. } => set,
        }
    }
}

/// Bulk edit: removals are applied before additions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RespecAction {
    /// Nodes to allocate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add: Vec<NodeAction>,
    /// Nodes to deallocate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<NodeId>,
}

/// Entry of the edit log.
///
/// Serialized as an integer, `{"id", "set"}`, or `{"add"?, "remove"?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HistoryStep {
    /// Single allocation, weapon set 0.
    Id(NodeId),
    /// Single allocation into a weapon set.
    Tagged {
        /// Node id.
        id: NodeId,
        /// Weapon set.
        #[serde(default)]
        set: u8,
    },
    /// Bulk edit.
    Respec(RespecAction),
}

impl HistoryStep {
    /// The allocation of a single-node step.
    pub const fn node(&self) -> Option<NodeAction> {
        match *self {
            Self::Id(id) => Some(NodeAction::Id(id)),
            Self::Tagged { id, set } => Some(NodeAction::Tagged { id, set }),
            Self::Respec(_) => None,
        }
    }

    /// Bulk edit step.
    pub const fn is_respec(&self) -> bool {
        matches!(self, Self::Respec(_))
    }
}

impl From<NodeAction> for HistoryStep {
    fn from(action: NodeAction) -> Self {
        match action {
            NodeAction::Id(id) => Self::Id(id),
            NodeAction::Tagged { id, set } => Self::Tagged { id, set },
        }
    }
}

/// Point usage of a node set plus the budget it grants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeTotals {
    /// Points in use per category.
    pub count: NodeCount,
    /// Extra ordinary points granted.
    pub points: i32,
    /// Extra weapon-set points granted.
    pub weapon_points: i32,
}

/// Node → weapon set after replaying `steps`.
///
/// A selected multiple-choice option also marks its parent, which the log
/// never stores.
pub fn history_nodes(access: TreeAccess<'_>, steps: &[HistoryStep]) -> BTreeMap<NodeId, u8> {
    let mut nodes = BTreeMap::new();
    for step in steps {
        match step {
            HistoryStep::Id(id) => {
                nodes.insert(*id, 0);
            }
            HistoryStep::Tagged { id, set } => {
                nodes.insert(*id, *set);
            }
            HistoryStep::Respec(respec) => {
                for action in &respec.add {
                    nodes.insert(action.id(), action.set());
                }
                for id in &respec.remove {
                    nodes.remove(id);
                }
            }
        }
    }

    let parents: Vec<(NodeId, u8)> = nodes
        .iter()
        .filter_map(|(&id, &set)| {
            let skill = access.skill(id)?;
            if !skill.is_multiple_choice_option {
                return None;
            }
            let parent = access.tree.nodes.get(&id)?.connections.first()?;
            Some((parent.id, set))
        })
        .collect();
    nodes.extend(parents);
    nodes
}

fn tally(count: &mut NodeCount, skill: &SkillDefinition, set: u8, delta: i32) {
    if skill.ascendancy.is_some() {
        count.ascendancy += delta;
    } else if let Some(sub_tree) = &skill.atlas_sub_tree {
        *count.sub_trees.entry(sub_tree.clone()).or_insert(0) += delta;
    } else {
        count.normal += delta;
        count.add_weapon_set(set, delta);
    }
}

/// Points used by `nodes` and the extra budget they grant.
///
/// Ids missing from the catalog are synthesized cluster nodes and count as
/// ordinary points.
pub fn count_nodes(access: TreeAccess<'_>, nodes: &BTreeMap<NodeId, u8>) -> NodeTotals {
    let mut totals = NodeTotals::default();
    for (&id, &set) in nodes {
        let Some(skill) = access.skill(id) else {
            totals.count.normal += 1;
            totals.count.add_weapon_set(set, 1);
            continue;
        };
        if skill.is_multiple_choice_option {
            continue;
        }
        tally(&mut totals.count, skill, set, 1);
        totals.points += skill.skill_points;
        totals.weapon_points += skill.weapon_points;
    }
    totals
}

fn mark(view: &mut TreeViewState, nodes: &BTreeMap<NodeId, u8>, state: NodeState) {
    for (&id, &set) in nodes {
        view.nodes.insert(id, PackedState::new(state, set));
    }
}

/// Replays the history prefix of `src` into a snapshot.
///
/// Besides the allocated nodes the snapshot carries the hover preview, the
/// diff since the start position, and the focus or search highlight.
pub fn tree_view_state(
    catalog: &Catalog,
    props: &TreeProperties,
    src: &TreeEditingState,
    items: &dyn ItemStore,
) -> Result<TreeViewState, CatalogError> {
    let access = catalog.tree(props.version, props.variant.is_atlas())?;
    let position = src.clamped_position();
    let mut nodes = history_nodes(access, &src.history[..position]);
    let totals = count_nodes(access, &nodes);
    let searching = src.search.as_deref().is_some_and(|text| !text.is_empty());

    let mut view = TreeViewState {
        version: props.version,
        variant: props.variant.clone(),
        show_hidden_nodes: props.show_hidden_nodes,
        nodes: BTreeMap::new(),
        active_set: src.active_set,
        masteries: src.masteries.clone(),
        jewels: src.jewels.clone(),
        attributes: src.attributes.clone(),
        hover: src.hover,
        highlight: None,
        limit: props
            .limit
            .as_ref()
            .map(|limit| limit.raised(totals.points, totals.weapon_points)),
        count: totals.count,
    };

    match (src.hover.filter(|_| !props.read_only), src.start_position) {
        (Some(hover), _) => {
            mark(&mut view, &nodes, NodeState::Active);
            let (action, radius) = {
                let data = TreeData::new(catalog, &view, items)?;
                let action = toggle_action(&data, hover).unwrap_or_default();
                let radius = if src.focus.is_none() && !searching {
                    radius_jewel(&data, hover, false).map(|radius| data.nodes_in_radius(&radius))
                } else {
                    None
                };
                (action, radius)
            };

            let valid = match &props.limit {
                None => true,
                Some(limit) => {
                    for add in &action.add {
                        nodes.insert(add.id(), add.set());
                    }
                    for id in &action.remove {
                        nodes.remove(id);
                    }
                    let preview = count_nodes(access, &nodes);
                    check_limit(
                        &preview.count,
                        &limit.raised(preview.points, preview.weapon_points),
                    )
                }
            };
            if valid {
                for add in &action.add {
                    view.nodes
                        .insert(add.id(), PackedState::new(NodeState::Add, add.set()));
                }
                for &id in &action.remove {
                    let packed = view.packed(id).with_state(NodeState::Remove);
                    view.nodes.insert(id, packed);
                }
            } else {
                for add in &action.add {
                    view.nodes.insert(
                        add.id(),
                        PackedState::new(NodeState::RemoveHistory, add.set()),
                    );
                }
            }
            if radius.is_some() {
                view.highlight = radius;
            }
        }
        (None, Some(start)) if start < position => {
            let mut before = history_nodes(access, &src.history[..start]);
            for (&id, &set) in &nodes {
                let state = if before.remove(&id).is_some() {
                    NodeState::Active
                } else {
                    NodeState::AddHistory
                };
                view.nodes.insert(id, PackedState::new(state, set));
            }
            mark(&mut view, &before, NodeState::RemoveHistory);
        }
        _ => mark(&mut view, &nodes, NodeState::Active),
    }

    if let Some(focus) = &src.focus {
        view.highlight = Some(focus.clone());
    } else if let Some(text) = src.search.as_deref().filter(|_| searching) {
        let pattern = match RegexBuilder::new(&regex::escape(text))
            .case_insensitive(true)
            .build()
        {
            Ok(pattern) => pattern,
            Err(err) => {
                debug!(error = %err, "search text does not compile");
                return Ok(view);
            }
        };
        let highlight: Vec<NodeId> = {
            let data = TreeData::new(catalog, &view, items)?;
            data.all_nodes()
                .into_iter()
                .filter(|&id| {
                    let Some(skill) = data.node_skill(id) else {
                        return false;
                    };
                    if skill.is_ascendancy_root || skill.is_starting_node() || skill.is_just_icon {
                        return false;
                    }
                    pattern.is_match(&skill.name)
                        || skill.stats.keys().any(|stat| pattern.is_match(stat))
                        || skill
                            .aura
                            .as_ref()
                            .is_some_and(|aura| aura.stats.keys().any(|stat| pattern.is_match(stat)))
                })
                .collect()
        };
        view.highlight = Some(highlight);
    }

    Ok(view)
}

/// `src` without the overlays that only matter for display.
pub fn light_state(src: &TreeEditingState) -> TreeEditingState {
    TreeEditingState {
        start_position: None,
        hover: None,
        focus: None,
        search: None,
        ..src.clone()
    }
}

/// Allocation states layered over a snapshot during validation.
struct Simulation<'d, 'a> {
    data: &'d TreeData<'a>,
    overrides: FxHashMap<NodeId, PackedState>,
}

impl NodeStates for Simulation<'_, '_> {
    fn node_state(&self, id: NodeId) -> Option<PackedState> {
        let node = self.data.node(id)?;
        Some(self.overrides.get(&id).copied().unwrap_or_else(|| node.packed()))
    }

    fn allocated(&self) -> BTreeMap<NodeId, PackedState> {
        let mut all = self.data.allocated();
        for (&id, &packed) in &self.overrides {
            if packed.is_set() {
                all.insert(id, packed);
            } else {
                all.remove(&id);
            }
        }
        all
    }
}

struct Validator<'d, 'a> {
    sim: Simulation<'d, 'a>,
    connected: Connected,
    leaps: Vec<RadiusJewel<'a>>,
    count: NodeCount,
    limit: Option<NodeCount>,
}

impl Validator<'_, '_> {
    fn state(&self, id: NodeId) -> PackedState {
        self.sim.node_state(id).unwrap_or_default()
    }

    fn within_limit(&self) -> bool {
        self.limit
            .as_ref()
            .is_none_or(|limit| check_limit(&self.count, limit))
    }

    fn grant(&mut self, skill: &SkillDefinition, delta: i32) {
        if let Some(limit) = &mut self.limit {
            limit.normal += skill.skill_points * delta;
            for set in &mut limit.weapon_set {
                *set += skill.weapon_points * delta;
            }
        }
    }

    fn reconnect(&mut self) {
        let data = self.sim.data;
        self.connected.clear();
        connected_nodes(data, &self.sim, &mut self.connected, &data.start_nodes(), 0, &[]);
    }

    fn add_node(&mut self, id: NodeId, set: u8, check: bool) -> bool {
        let data = self.sim.data;
        let Some(node) = data.node(id) else { return false };
        if node.immutable || self.state(id).state() != NodeState::None {
            return false;
        }
        let mut connect = true;
        if node.skill.is_multiple_choice_option {
            // the parent goes first; it fails when two options are taken at once
            let Some(parent) = node.connections.first().map(|edge| edge.id) else {
                return false;
            };
            if !self.add_node(parent, set, check) {
                return false;
            }
        } else if check {
            let linked = node.connections.iter().any(|edge| {
                if !self.connected.contains_key(&edge.id) {
                    return false;
                }
                let Some(prev) = data.node(edge.id) else { return false };
                let prev_state = self.state(edge.id);
                prev_state.state() != NodeState::None
                    && (prev_state.weapon_set() == 0 || prev_state.weapon_set() == set)
                    && !(node.skill.ascendancy.is_some() && prev.skill.ascendancy.is_none())
            });
            if !linked {
                if !has_leap(&self.leaps, &self.connected, &node, set) {
                    return false;
                }
                connect = false;
            }
        }

        self.sim
            .overrides
            .insert(id, PackedState::new(NodeState::Active, set));
        if connect {
            connected_nodes(data, &self.sim, &mut self.connected, &[id], set, &[]);
        }
        if !node.skill.is_multiple_choice {
            tally(&mut self.count, &node.skill, set, 1);
        }
        self.grant(&node.skill, 1);
        true
    }

    fn release(&mut self, id: NodeId, skill: &SkillDefinition, set: u8) {
        if !skill.is_multiple_choice {
            tally(&mut self.count, skill, set, -1);
        }
        self.sim.overrides.insert(id, PackedState::default());
        self.grant(skill, -1);
    }

    fn remove_node(&mut self, id: NodeId) -> bool {
        let Some(node) = self.sim.data.node(id) else { return false };
        let current = self.state(id);
        if node.immutable || current.state() == NodeState::None {
            return false;
        }
        if node.skill.is_multiple_choice_option {
            if let Some(parent) = node.connections.first() {
                self.remove_node(parent.id);
            }
        }
        self.release(id, &node.skill, current.weapon_set());
        true
    }

    /// Evicts allocated nodes that lost their connection, ascending by id.
    fn sweep(&mut self) -> Vec<NodeId> {
        let mut evicted = Vec::new();
        for (id, packed) in self.sim.allocated() {
            if self.connected.contains_key(&id) {
                continue;
            }
            let Some(node) = self.sim.data.node(id) else { continue };
            if has_leap(&self.leaps, &self.connected, &node, packed.weapon_set()) {
                continue;
            }
            self.release(id, &node.skill, packed.weapon_set());
            evicted.push(id);
        }
        evicted
    }

    fn respec(&mut self, respec: &RespecAction) -> RespecAction {
        let mut result = RespecAction::default();
        for &id in &respec.remove {
            if self.remove_node(id) {
                result.remove.push(id);
            }
        }
        for action in &respec.add {
            if self.add_node(action.id(), action.set(), false) {
                result.add.push(NodeAction::new(action.id(), action.set()));
            }
        }
        self.reconnect();
        for id in self.sweep() {
            if let Some(index) = result.add.iter().position(|add| add.id() == id) {
                result.add.remove(index);
            } else {
                result.remove.push(id);
            }
        }
        result
    }
}

/// Replays `steps` on top of the cursor of `src` and returns the longest
/// valid rewrite.
///
/// Single steps that do not connect are dropped; respec steps lose the parts
/// that fail and gain removals for every node they orphan. Replay stops at
/// the first step that exceeds the budget.
pub fn validate_history(
    catalog: &Catalog,
    props: &TreeProperties,
    src: &TreeEditingState,
    steps: &[HistoryStep],
    items: &dyn ItemStore,
) -> Result<Vec<HistoryStep>, CatalogError> {
    let view = tree_view_state(catalog, props, &light_state(src), items)?;
    let data = TreeData::new(catalog, &view, items)?;
    let mut validator = Validator {
        sim: Simulation {
            data: &data,
            overrides: FxHashMap::default(),
        },
        connected: Connected::default(),
        leaps: leap_jewels(&data),
        count: view.count.clone(),
        limit: view.limit.clone(),
    };
    validator.reconnect();

    let mut result = Vec::with_capacity(steps.len());
    for step in steps {
        match step {
            HistoryStep::Id(_) | HistoryStep::Tagged { .. } => {
                let Some(action) = step.node() else { continue };
                if !validator.add_node(action.id(), action.set(), true) {
                    debug!(node = action.id(), set = action.set(), "dropping unreachable step");
                    continue;
                }
                if !validator.within_limit() {
                    debug!(node = action.id(), "point budget reached; truncating history");
                    return Ok(result);
                }
                result.push(step.clone());
            }
            HistoryStep::Respec(respec) => {
                let applied = validator.respec(respec);
                if !validator.within_limit() {
                    debug!(step = result.len(), "point budget reached; truncating history");
                    return Ok(result);
                }
                if !applied.add.is_empty() || !applied.remove.is_empty() {
                    result.push(HistoryStep::Respec(applied));
                }
            }
        }
    }
    Ok(result)
}

fn unique_actions(actions: &[NodeAction]) -> Vec<NodeAction> {
    let mut unique: Vec<NodeAction> = Vec::with_capacity(actions.len());
    for &action in actions {
        match unique.iter_mut().find(|seen| seen.id() == action.id()) {
            Some(seen) => *seen = NodeAction::new(action.id(), action.set()),
            None => unique.push(NodeAction::new(action.id(), action.set())),
        }
    }
    unique
}

fn merge_into(top: &mut RespecAction, add: &[NodeAction], remove: &[NodeId]) {
    let mut adding = unique_actions(add);
    top.remove.retain(|id| match adding.iter().position(|a| a.id() == *id) {
        Some(index) => {
            adding.remove(index);
            false
        }
        None => true,
    });
    top.add.extend(adding);

    let mut removing: Vec<NodeId> = Vec::with_capacity(remove.len());
    for &id in remove {
        if !removing.contains(&id) {
            removing.push(id);
        }
    }
    top.add.retain(|a| match removing.iter().position(|&id| id == a.id()) {
        Some(index) => {
            removing.remove(index);
            false
        }
        None => true,
    });
    top.remove.extend(removing);
}

/// Drops the most recent step that allocated `id`.
fn unwind_allocation(history: &mut Vec<HistoryStep>, id: NodeId) {
    for pos in (0..history.len()).rev() {
        let drop_step = match &mut history[pos] {
            HistoryStep::Id(step) | HistoryStep::Tagged { id: step, .. } => {
                if *step != id {
                    continue;
                }
                true
            }
            HistoryStep::Respec(respec) => {
                let Some(index) = respec.add.iter().position(|a| a.id() == id) else {
                    continue;
                };
                respec.add.remove(index);
                respec.add.is_empty() && respec.remove.is_empty()
            }
        };
        if drop_step {
            history.remove(pos);
        }
        return;
    }
}

fn respec_step(add: &[NodeAction], remove: &[NodeId]) -> HistoryStep {
    HistoryStep::Respec(RespecAction {
        add: add.to_vec(),
        remove: remove.to_vec(),
    })
}

/// Appends an edit at the cursor of `src`.
///
/// The candidate log is replayed from scratch. When replay would rewrite it,
/// the edit is recorded verbatim as a respec step instead, unless the result
/// exceeds the budget, in which case `src` is returned unchanged. The redo
/// tail is discarded, or re-validated when `edit_history` is set.
pub fn modify_history(
    catalog: &Catalog,
    props: &TreeProperties,
    src: &TreeEditingState,
    add: &[NodeAction],
    remove: &[NodeId],
    items: &dyn ItemStore,
) -> Result<TreeEditingState, CatalogError> {
    let position = src.clamped_position();
    let mut history = src.history[..position].to_vec();
    let remaining = &src.history[position..];

    if src.recording {
        match history.last_mut() {
            Some(HistoryStep::Respec(top)) => merge_into(top, add, remove),
            _ => history.push(respec_step(add, remove)),
        }
    } else if !add.is_empty() && !remove.is_empty() {
        // a lone swap right after allocating the removed node replaces that step
        let swap = add.len() == 1
            && remove.len() == 1
            && history.last() == Some(&HistoryStep::Id(remove[0]));
        if swap {
            history.pop();
            history.push(add[0].into());
        } else {
            history.push(respec_step(add, remove));
        }
    } else {
        for &id in remove {
            unwind_allocation(&mut history, id);
        }
        history.extend(add.iter().map(|&action| HistoryStep::from(action)));
    }

    let mut result = TreeEditingState {
        history: Vec::new(),
        position: 0,
        start_position: None,
        ..src.clone()
    };
    let checked = validate_history(catalog, props, &result, &history, items)?;
    if checked == history {
        result.history = history;
    } else {
        if props.limit.is_some() {
            let candidate = TreeEditingState {
                position: history.len(),
                history,
                ..result.clone()
            };
            let view = tree_view_state(catalog, props, &light_state(&candidate), items)?;
            if view
                .limit
                .as_ref()
                .is_some_and(|limit| !check_limit(&view.count, limit))
            {
                debug!(adds = add.len(), removes = remove.len(), "edit exceeds the point budget");
                return Ok(src.clone());
            }
        }
        debug!(
            adds = add.len(),
            removes = remove.len(),
            "edit rewrites history; recording it as a respec step"
        );
        result.history = src.history[..position].to_vec();
        result.history.push(respec_step(add, remove));
    }
    result.position = result.history.len();

    if !remaining.is_empty() && src.edit_history {
        let tail = validate_history(catalog, props, &result, remaining, items)?;
        result.history.extend(tail);
    }
    Ok(result)
}

/// Toggles `id`: allocates the shortest path to it or removes it with
/// everything that depends on it.
///
/// Multiple-choice parents are never stored in the log. When `attribute` is
/// given, every added node records it as its attribute choice.
pub fn toggle_node(
    catalog: &Catalog,
    props: &TreeProperties,
    src: &TreeEditingState,
    id: NodeId,
    items: &dyn ItemStore,
    attribute: Option<usize>,
) -> Result<TreeEditingState, CatalogError> {
    let view = tree_view_state(catalog, props, &light_state(src), items)?;
    let data = TreeData::new(catalog, &view, items)?;
    let Some(action) = toggle_action(&data, id).filter(|action| !action.is_empty()) else {
        trace!(node = id, "toggle has no effect");
        return Ok(src.clone());
    };

    let add: Vec<NodeAction> = action
        .add
        .into_iter()
        .filter(|add| {
            data.node(add.id()).is_some_and(|node| {
                node.state == NodeState::None && !node.skill.is_multiple_choice
            })
        })
        .collect();
    let remove: Vec<NodeId> = action
        .remove
        .into_iter()
        .filter(|&id| {
            data.node(id).is_none_or(|node| {
                node.state != NodeState::None && !node.skill.is_multiple_choice
            })
        })
        .collect();

    let mut next = modify_history(catalog, props, src, &add, &remove, items)?;
    if let Some(attribute) = attribute {
        for action in &add {
            next.attributes.insert(action.id(), attribute);
        }
    }
    Ok(next)
}

/// Starts or stops grouping edits into one respec step.
///
/// Starting inserts an empty step at the cursor.
pub fn toggle_recording(props: &TreeProperties, src: &TreeEditingState) -> TreeEditingState {
    if props.read_only {
        return src.clone();
    }
    if src.recording {
        return TreeEditingState {
            recording: false,
            ..src.clone()
        };
    }
    let position = src.clamped_position();
    let mut history = src.history.clone();
    history.insert(position, HistoryStep::Respec(RespecAction::default()));
    TreeEditingState {
        history,
        position: position + 1,
        start_position: None,
        recording: true,
        ..src.clone()
    }
}

/// Whether `step` physically extends `prev`.
fn is_connected(data: &TreeData<'_>, step: &HistoryStep, prev: &HistoryStep) -> bool {
    let (Some(step), Some(prev)) = (step.node(), prev.node()) else {
        return false;
    };
    let Some(node) = data.node(step.id()) else { return false };
    let links = |id: NodeId| node.connections.iter().any(|edge| edge.id == id);
    match prev {
        NodeAction::Id(id) => links(id),
        NodeAction::Tagged { id, set } => set == step.set() && links(id),
    }
}

fn at_chain(history: &[HistoryStep], position: usize) -> bool {
    position > 0
        && history
            .get(position - 1)
            .is_some_and(|step| !step.is_respec())
}

/// Cursor after skipping forward over a run of chained single steps.
pub fn history_next_position(
    catalog: &Catalog,
    props: &TreeProperties,
    state: &TreeEditingState,
    position: usize,
    items: &dyn ItemStore,
) -> Result<usize, CatalogError> {
    let history = &state.history;
    if !at_chain(history, position) {
        return Ok(position);
    }
    let view = tree_view_state(catalog, props, &light_state(state), items)?;
    let data = TreeData::new(catalog, &view, items)?;
    let mut position = position;
    while position < history.len() && is_connected(&data, &history[position], &history[position - 1])
    {
        position += 1;
    }
    Ok(position)
}

/// Cursor after skipping back over a run of chained single steps.
///
/// A run reaching the first step rewinds to 0.
pub fn history_prev_position(
    catalog: &Catalog,
    props: &TreeProperties,
    state: &TreeEditingState,
    position: usize,
    items: &dyn ItemStore,
) -> Result<usize, CatalogError> {
    let history = &state.history;
    if !at_chain(history, position) {
        return Ok(position);
    }
    let view = tree_view_state(catalog, props, &light_state(state), items)?;
    let data = TreeData::new(catalog, &view, items)?;
    let mut position = position;
    while position >= 2 && is_connected(&data, &history[position - 2], &history[position - 1]) {
        position -= 1;
    }
    Ok(if position == 1 { 0 } else { position })
}
