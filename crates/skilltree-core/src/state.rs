// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Snapshot, configuration and budget types.
use std::collections::BTreeMap;

use blake3::Hasher;
use serde::{Deserialize, Serialize};

use crate::history::HistoryStep;
use crate::ident::{ItemId, NodeId};

/// Per-node allocation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum NodeState {
    /// Not allocated.
    #[default]
    None = 0,
    /// Allocated.
    Active = 1,
    /// Pending addition (hover preview).
    Add = 2,
    /// Pending removal (hover preview).
    Remove = 3,
    /// Committed since the start position.
    AddHistory = 4,
    /// Removed since the start position, or a preview rejected by budget.
    RemoveHistory = 5,
}

impl NodeState {
    /// Whether the node currently grants its effect.
    pub const fn is_contributing(self) -> bool {
        matches!(self, Self::Active | Self::Remove | Self::AddHistory)
    }

    const fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Self::Active,
            2 => Self::Add,
            3 => Self::Remove,
            4 => Self::AddHistory,
            5 => Self::RemoveHistory,
            _ => Self::None,
        }
    }
}

/// [`NodeState`] in the low nibble, weapon set in the bits above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackedState(u8);

impl PackedState {
    /// Mask of the state nibble.
    pub const STATE_MASK: u8 = 0x0f;
    /// Shift of the weapon-set tag.
    pub const WEAPON_SET_SHIFT: u8 = 4;

    /// Packs a state with its weapon set.
    pub const fn new(state: NodeState, weapon_set: u8) -> Self {
        Self(state as u8 | (weapon_set << Self::WEAPON_SET_SHIFT))
    }

    /// Raw encoding.
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// State part.
    pub const fn state(self) -> NodeState {
        NodeState::from_bits(self.0 & Self::STATE_MASK)
    }

    /// Weapon-set part.
    pub const fn weapon_set(self) -> u8 {
        self.0 >> Self::WEAPON_SET_SHIFT
    }

    /// Same weapon set, different state.
    pub const fn with_state(self, state: NodeState) -> Self {
        Self((self.0 & !Self::STATE_MASK) | state as u8)
    }

    /// Non-zero raw value.
    pub const fn is_set(self) -> bool {
        self.0 != 0
    }
}

/// Point usage (or budget) per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeCount {
    /// Ordinary points.
    pub normal: i32,
    /// Points spent per weapon set 1..=3.
    pub weapon_set: [i32; 3],
    /// Ascendancy points.
    pub ascendancy: i32,
    /// Atlas sub-tree points.
    pub sub_trees: BTreeMap<String, i32>,
}

impl NodeCount {
    /// Character tree budget.
    pub fn passive_default() -> Self {
        Self {
            normal: 123,
            weapon_set: [24, 24, 0],
            ascendancy: 8,
            sub_trees: BTreeMap::new(),
        }
    }

    /// Atlas tree budget.
    pub fn atlas_default() -> Self {
        let sub_trees = [
            ("Breach", 8),
            ("Expedition", 8),
            ("Delirium", 8),
            ("Ritual", 8),
            ("Boss", 10),
            ("PinnacleBoss", 6),
        ]
        .into_iter()
        .map(|(name, limit)| (name.to_owned(), limit))
        .collect();
        Self {
            normal: 30,
            weapon_set: [0, 0, 0],
            ascendancy: 0,
            sub_trees,
        }
    }

    /// Budget raised by points granted from allocated nodes.
    pub fn raised(&self, points: i32, weapon_points: i32) -> Self {
        let mut limit = self.clone();
        limit.normal += points;
        for set in &mut limit.weapon_set {
            *set += weapon_points;
        }
        limit
    }

    /// Adds `delta` to the weapon-set counter for `set` (0 = none).
    pub(crate) fn add_weapon_set(&mut self, set: u8, delta: i32) {
        if let Some(slot) = (set as usize)
            .checked_sub(1)
            .and_then(|i| self.weapon_set.get_mut(i))
        {
            *slot += delta;
        }
    }
}

/// Whether every category of `count` is within `limit`.
///
/// Sub-trees absent from the limit have a budget of zero.
pub fn check_limit(count: &NodeCount, limit: &NodeCount) -> bool {
    count.normal <= limit.normal
        && count.ascendancy <= limit.ascendancy
        && count
            .weapon_set
            .iter()
            .zip(&limit.weapon_set)
            .all(|(used, budget)| used <= budget)
        && count
            .sub_trees
            .iter()
            .all(|(id, used)| *used <= limit.sub_trees.get(id).copied().unwrap_or(0))
}

/// Character tree selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassiveTreeConfig {
    /// Character class.
    pub char_class: String,
    /// Selected ascendancy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ascendancy: Option<String>,
    /// Show only the ascendancy sub-tree.
    pub ascendancy_only: bool,
}

/// Atlas tree selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasTreeConfig {}

/// Which tree a build edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeVariant {
    /// Character passive tree.
    Passive(PassiveTreeConfig),
    /// Atlas tree.
    Atlas(AtlasTreeConfig),
}

impl TreeVariant {
    /// Atlas tree.
    pub const fn is_atlas(&self) -> bool {
        matches!(self, Self::Atlas(_))
    }

    /// Passive selection, if any.
    pub const fn passive(&self) -> Option<&PassiveTreeConfig> {
        match self {
            Self::Passive(config) => Some(config),
            Self::Atlas(_) => None,
        }
    }

    /// Default budget for the variant.
    pub fn default_limit(&self) -> NodeCount {
        match self {
            Self::Passive(_) => NodeCount::passive_default(),
            Self::Atlas(_) => NodeCount::atlas_default(),
        }
    }
}

/// Tree configuration of one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeProperties {
    /// Catalog version.
    pub version: u32,
    /// Disables hover previews and recording.
    #[serde(default)]
    pub read_only: bool,
    /// Reveals anointment-only nodes.
    #[serde(default)]
    pub show_hidden_nodes: bool,
    /// Point budget; unlimited when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<NodeCount>,
    /// Tree variant.
    #[serde(flatten)]
    pub variant: TreeVariant,
}

/// Editable state of one build variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeEditingState {
    /// Edit log.
    pub history: Vec<HistoryStep>,
    /// Replay cursor.
    pub position: usize,
    /// Diff baseline; shows additions and removals since this position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_position: Option<usize>,
    /// Weapon set new allocations go into.
    pub active_set: u8,
    /// Mastery selections.
    pub masteries: BTreeMap<NodeId, u32>,
    /// Socketed jewels.
    pub jewels: BTreeMap<NodeId, ItemId>,
    /// Attribute choice per node.
    pub attributes: BTreeMap<NodeId, usize>,
    /// Hovered node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover: Option<NodeId>,
    /// Group new edits into the step at the cursor.
    pub recording: bool,
    /// Re-validate the redo tail instead of discarding it.
    pub edit_history: bool,
    /// Search text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Explicit highlight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<Vec<NodeId>>,
}

impl TreeEditingState {
    /// Cursor clamped to the history length.
    pub fn clamped_position(&self) -> usize {
        self.position.min(self.history.len())
    }
}

/// Authoritative snapshot produced by history replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeViewState {
    /// Catalog version.
    pub version: u32,
    /// Tree variant.
    pub variant: TreeVariant,
    /// Reveals anointment-only nodes.
    #[serde(default)]
    pub show_hidden_nodes: bool,
    /// Packed state of every non-default node.
    pub nodes: BTreeMap<NodeId, PackedState>,
    /// Weapon set new allocations go into.
    pub active_set: u8,
    /// Mastery selections.
    pub masteries: BTreeMap<NodeId, u32>,
    /// Socketed jewels.
    pub jewels: BTreeMap<NodeId, ItemId>,
    /// Attribute choice per node.
    pub attributes: BTreeMap<NodeId, usize>,
    /// Hovered node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover: Option<NodeId>,
    /// Decoration-only highlight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Vec<NodeId>>,
    /// Effective (elastic) budget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<NodeCount>,
    /// Points in use.
    pub count: NodeCount,
}

impl TreeViewState {
    /// Packed state of `id` (default when absent).
    pub fn packed(&self, id: NodeId) -> PackedState {
        self.nodes.get(&id).copied().unwrap_or_default()
    }

    /// Content digest over version, variant, active set and node states.
    ///
    /// Overlays (hover, highlight) are not part of the digest.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Hasher::new();
        hasher.update(&self.version.to_le_bytes());
        match &self.variant {
            TreeVariant::Passive(config) => {
                hasher.update(&[0]);
                hasher.update(&(config.char_class.len() as u64).to_le_bytes());
                hasher.update(config.char_class.as_bytes());
                let ascendancy = config.ascendancy.as_deref().unwrap_or_default();
                hasher.update(&(ascendancy.len() as u64).to_le_bytes());
                hasher.update(ascendancy.as_bytes());
                hasher.update(&[u8::from(config.ascendancy_only)]);
            }
            TreeVariant::Atlas(_) => {
                hasher.update(&[1]);
            }
        }
        hasher.update(&[self.active_set]);
        hasher.update(&(self.nodes.len() as u64).to_le_bytes());
        for (id, state) in &self.nodes {
            hasher.update(&id.to_le_bytes());
            hasher.update(&[state.raw()]);
        }
        hasher.finalize().into()
    }
}
