// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Static tree catalog: the read-only game data the engine queries.
//!
//! The catalog is keyed by tree version and is never mutated by the engine.
//! Everything here is plain serde data; the engine only performs id-keyed
//! lookups against it.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ident::NodeId;
use crate::stats::Stats;

/// Errors raised while loading or selecting catalog data.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog JSON failed to decode.
    #[error("catalog decode error: {0}")]
    Json(#[from] serde_json::Error),
    /// No tree data exists for the requested version.
    #[error("unknown tree version {0}")]
    UnknownVersion(u32),
    /// The version has no atlas tree but an atlas build asked for one.
    #[error("tree version {0} has no atlas tree")]
    MissingAtlasTree(u32),
}

/// Immutable definition of a passive skill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillDefinition {
    /// Display name.
    pub name: String,
    /// Icon asset path.
    pub icon: String,
    /// Stats granted when allocated.
    pub stats: Stats,
    /// Stats before timeless additions were layered on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_stats: Option<Stats>,
    /// Notable passive.
    pub is_notable: bool,
    /// Keystone passive.
    pub is_keystone: bool,
    /// Jewel socket.
    pub is_jewel_socket: bool,
    /// Root of an ascendancy sub-tree.
    pub is_ascendancy_root: bool,
    /// Decorative node that can never be traversed.
    pub is_just_icon: bool,
    /// Parent of a set of mutually exclusive options.
    pub is_multiple_choice: bool,
    /// One option of a multiple-choice parent (its first connection).
    pub is_multiple_choice_option: bool,
    /// Cluster proxy node next to a large socket.
    pub is_proxy: bool,
    /// Atlas wormhole node.
    pub is_wormhole: bool,
    /// Only reachable through anointments; hidden by default.
    pub is_anointment_only: bool,
    /// Node grants nothing.
    pub disabled: bool,
    /// Classes for which this node is the starting root.
    pub starting_node: Vec<String>,
    /// Ascendancy tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ascendancy: Option<String>,
    /// Atlas sub-tree budget category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atlas_sub_tree: Option<String>,
    /// Extra normal points granted when allocated.
    pub skill_points: i32,
    /// Extra weapon-set points granted when allocated.
    pub weapon_points: i32,
    /// Aura stats applied to allies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aura: Option<AuraDefinition>,
    /// Mastery descriptor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mastery: Option<MasteryDefinition>,
    /// Alternate-tree id when the skill came out of a timeless reroll.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate: Option<String>,
    /// Flavour text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flavour_text: Option<String>,
}

impl SkillDefinition {
    /// True for start nodes of any class.
    pub fn is_starting_node(&self) -> bool {
        !self.starting_node.is_empty()
    }

    /// Copy of this skill with no stats and no aura.
    pub fn emptied(&self) -> Self {
        Self {
            stats: Stats::new(),
            aura: None,
            ..self.clone()
        }
    }
}

/// Aura stats block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuraDefinition {
    /// Aura stats.
    pub stats: Stats,
}

/// Mastery descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryDefinition {
    /// Stat that counts selections of this mastery.
    pub count_stat: String,
}

/// Edge to a neighbouring node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Neighbour id.
    pub id: NodeId,
    /// Arc radius for rendering (0 = straight).
    #[serde(default)]
    pub radius: i32,
}

impl Connection {
    /// Straight edge to `id`.
    pub const fn to(id: NodeId) -> Self {
        Self { id, radius: 0 }
    }
}

/// Reference from a node to its skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SkillRef {
    /// Current format: skill table key.
    Id {
        /// Key into the version's skill table.
        skill_id: String,
    },
    /// Legacy format: skill stored inline on the node.
    Inline {
        /// Optional stable id of the inline skill.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ref_id: Option<String>,
        /// The skill itself.
        #[serde(flatten)]
        skill: Box<SkillDefinition>,
    },
}

/// Raw catalog node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Owning group id.
    pub parent: u32,
    /// Orbit index into [`ORBIT_RADII`](crate::ORBIT_RADII).
    pub radius: usize,
    /// Slot on the orbit.
    pub position: u32,
    /// Neighbours, in catalog order.
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// Skill reference.
    #[serde(flatten)]
    pub skill: SkillRef,
}

impl TreeNode {
    /// Key the node's skill is known by (`skill_id`, legacy `ref_id`, or the node id).
    pub fn skill_key(&self, id: NodeId) -> String {
        match &self.skill {
            SkillRef::Id { skill_id } => skill_id.clone(),
            SkillRef::Inline { ref_id, .. } => ref_id.clone().unwrap_or_else(|| id.to_string()),
        }
    }
}

/// Resolves the skill a raw node points at.
pub fn skill_of<'a>(
    node: &'a TreeNode,
    skills: &'a BTreeMap<String, SkillDefinition>,
) -> Option<&'a SkillDefinition> {
    match &node.skill {
        SkillRef::Id { skill_id } => skills.get(skill_id),
        SkillRef::Inline { skill, .. } => Some(skill),
    }
}

/// Orbit group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    /// Center x.
    pub x: f64,
    /// Center y.
    pub y: f64,
    /// Ascendancy tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ascendancy: Option<String>,
    /// Cluster proxy group.
    pub proxy: bool,
    /// Background orbit size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg: Option<usize>,
    /// Member nodes.
    pub nodes: Vec<NodeId>,
}

/// Graph definition of one tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeDefinition {
    /// Nodes keyed by id.
    pub nodes: BTreeMap<NodeId, TreeNode>,
    /// Groups keyed by id.
    pub groups: BTreeMap<u32, Group>,
    /// Class → class start node.
    pub character_root: BTreeMap<String, NodeId>,
    /// Ascendancy → ascendancy root node.
    pub ascendancy_root: BTreeMap<String, NodeId>,
    /// Always-active roots of an atlas tree.
    pub root_passives: Vec<NodeId>,
}

/// Tree data for one version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeVersionData {
    /// Character passive tree.
    pub passive_tree: TreeDefinition,
    /// Atlas tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atlas_passive_tree: Option<TreeDefinition>,
    /// Version-specific skill table; falls back to [`Catalog::passive_skills`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passive_skills: Option<BTreeMap<String, SkillDefinition>>,
}

/// Radius table row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JewelRadius {
    /// Plain radius.
    pub radius: f64,
    /// Inner ring radius.
    #[serde(default)]
    pub ring_inner: f64,
    /// Outer ring radius.
    #[serde(default)]
    pub ring_outer: f64,
}

/// Unique item data relevant to the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniqueDefinition {
    /// 1-based index into the radius table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jewel_radius: Option<usize>,
}

/// Cluster jewel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterJewelSize {
    /// Small cluster.
    Small,
    /// Medium cluster.
    Medium,
    /// Large cluster.
    Large,
}

/// Small-passive choice on a cluster jewel base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSkill {
    /// Skill id.
    pub id: String,
    /// Mastery skill granted alongside.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mastery: Option<String>,
}

/// Cluster jewel layout parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterJewelBase {
    /// Jewel size.
    pub size: ClusterJewelSize,
    /// Available small-passive skills.
    #[serde(default)]
    pub passive_skills: Vec<ClusterSkill>,
    /// Slot order used to place passives.
    pub small_indices: Vec<u32>,
    /// Slots that may hold sockets.
    pub socket_indices: Vec<u32>,
    /// Slots that may hold notables.
    pub notable_indices: Vec<u32>,
    /// Slots around the full ring.
    pub total_indices: u32,
}

/// Item base type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemBase {
    /// Cluster layout when the base is a cluster jewel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_jewel: Option<ClusterJewelBase>,
}

/// Socket skill classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JewelSlot {
    /// Largest cluster the socket accepts.
    pub size: ClusterJewelSize,
}

/// Notable that a cluster jewel grants when it carries `jewel_stat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNotable {
    /// Notable skill id.
    pub id: String,
    /// Jewel stat that grants it.
    pub jewel_stat: String,
}

/// Alternate (timeless) tree version parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlternateTreeVersion {
    /// Alternate tree id stamped on rerolled skills.
    pub id: String,
    /// Percent chance a notable is replaced (100+ = always).
    pub replace_notable_weight: u32,
    /// Replace pure-attribute small passives.
    pub replace_small_attributes: bool,
    /// Replace other small passives.
    pub replace_small_normal: bool,
    /// Minimum addition count.
    pub random_min: u32,
    /// Maximum addition count.
    pub random_max: u32,
}

/// Inclusive stat roll range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRange {
    /// Stat id.
    pub id: String,
    /// Lower bound.
    pub min: i64,
    /// Upper bound.
    pub max: i64,
}

/// Replacement skill in an alternate tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlternatePassiveSkill {
    /// Alternate tree version.
    pub version: u32,
    /// Display name.
    pub name: String,
    /// Icon.
    pub icon: String,
    /// Type mask: 1 attribute small, 2 small, 4 notable, 8 keystone.
    pub types: u32,
    /// Selection weight.
    pub weight: u32,
    /// Rolled stats.
    pub stats: Vec<StatRange>,
    /// Keystone tag this entry replaces.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keystone: Option<u32>,
    /// Internal revision of the keystone entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,
    /// Minimum additions after replacement.
    pub random_min: u32,
    /// Maximum additions after replacement.
    pub random_max: u32,
    /// Flavour text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flavour_text: Option<String>,
}

/// Additional stat roll layered onto a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlternatePassiveAddition {
    /// Alternate tree version.
    pub version: u32,
    /// Type mask (see [`AlternatePassiveSkill::types`]).
    pub types: u32,
    /// Selection weight.
    pub weight: u32,
    /// Rolled stats.
    pub stats: Vec<StatRange>,
}

/// Node-size gate of a mutation or bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeSize {
    /// Neither notable nor keystone.
    Small,
    /// Notable, not keystone.
    Notable,
    /// Keystone.
    Keystone,
    /// Anything but a keystone.
    NonKeystone,
    /// Tattoo-only; never matches a tree node.
    #[serde(alias = "tatoo")]
    Tattoo,
}

/// Allocation and size gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeNodeFilter {
    /// Match only allocated (`true`) or unallocated (`false`) nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocated: Option<bool>,
    /// Match only this node size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<NodeSize>,
}

/// Marker for "use the triggering jewel stat's own value".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JewelValue {
    /// The literal string `"value"`.
    Value,
}

/// Numeric parameter that is either fixed or taken from the jewel stat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BonusParam {
    /// Fixed number.
    Fixed(f64),
    /// The jewel stat's value.
    Jewel(JewelValue),
}

impl BonusParam {
    /// Resolves against the triggering jewel stat.
    pub fn resolve(self, jewel_value: f64) -> f64 {
        match self {
            Self::Fixed(value) => value,
            Self::Jewel(JewelValue::Value) => jewel_value,
        }
    }
}

/// Source stats of a convert/add mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MutationSource {
    /// One stat into another.
    Single {
        /// Source stat.
        from: String,
        /// Target stat.
        to: String,
    },
    /// Each mapped source stat into its target.
    Map {
        /// Source → target.
        map: BTreeMap<String, String>,
    },
}

/// Declarative per-node mutation applied by a jewel stat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeMutation {
    /// Node grants nothing.
    Disable {
        /// Gate.
        #[serde(default)]
        filter: TreeNodeFilter,
    },
    /// Flat stat added to the node.
    Stat {
        /// Stat id.
        id: String,
        /// Fixed amount; defaults to the jewel stat value.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<f64>,
        /// Multiplier.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        factor: Option<f64>,
        /// Gate.
        #[serde(default)]
        filter: TreeNodeFilter,
    },
    /// Move a scaled share of source stats into targets.
    Convert {
        /// Source stats.
        source: MutationSource,
        /// Extra percent on the moved amount.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        percent: Option<BonusParam>,
        /// Gate.
        #[serde(default)]
        filter: TreeNodeFilter,
    },
    /// Copy a scaled share of source stats into targets.
    Add {
        /// Source stats.
        source: MutationSource,
        /// Extra percent on the copied amount.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        percent: Option<BonusParam>,
        /// Gate.
        #[serde(default)]
        filter: TreeNodeFilter,
    },
    /// Scale every node stat by a percentage.
    Amplify {
        /// Percent.
        percent: BonusParam,
        /// Gate.
        #[serde(default)]
        filter: TreeNodeFilter,
    },
}

/// Which accumulated stats feed a jewel bonus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BonusSource {
    /// Several stats summed.
    Many(Vec<String>),
    /// One stat, or `"any"` for the whole accumulated bag.
    One(String),
}

impl BonusSource {
    /// `"any"`: contribute the whole accumulated bag.
    pub fn is_any(&self) -> bool {
        matches!(self, Self::One(id) if id == "any")
    }
}

/// Aggregate bonus a socketed jewel derives from nodes in its radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeBonus {
    /// Source stats.
    pub from: BonusSource,
    /// Target stat (unused for `"any"`).
    #[serde(default)]
    pub to: String,
    /// Bonus per unit; defaults to the jewel stat value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Grant once the source reaches this value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<BonusParam>,
    /// Grant per whole multiple of this divisor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divisor: Option<BonusParam>,
    /// Gate on contributing nodes.
    #[serde(default)]
    pub filter: TreeNodeFilter,
}

/// Stat semantics consumed by jewels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatSemantic {
    /// Semantic class; `"jewel_tree_transform"` marks aggregate bonuses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stat: Option<String>,
    /// Per-node mutations.
    pub tree_mutation: Vec<TreeMutation>,
    /// Aggregate bonuses.
    pub tree_bonus: Vec<TreeBonus>,
}

/// Semantic class of jewel stats that aggregate over their radius.
pub(crate) const JEWEL_TREE_TRANSFORM: &str = "jewel_tree_transform";

/// The whole read-only catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    /// Tree data per version.
    pub trees: BTreeMap<u32, TreeVersionData>,
    /// Shared skill table.
    pub passive_skills: BTreeMap<String, SkillDefinition>,
    /// Radius table (1-based references).
    pub jewel_radii: Vec<JewelRadius>,
    /// Unique items.
    pub uniques: BTreeMap<String, UniqueDefinition>,
    /// Item bases.
    pub item_bases: BTreeMap<String, ItemBase>,
    /// Socket skill → slot size.
    pub jewel_slots: BTreeMap<String, JewelSlot>,
    /// Cluster notables in grant order.
    pub cluster_jewel_notables: Vec<ClusterNotable>,
    /// Jewel stat → small-passive stat it grants.
    pub affliction_stats: BTreeMap<String, String>,
    /// Alternate tree versions.
    pub alternate_tree_versions: BTreeMap<u32, AlternateTreeVersion>,
    /// Alternate replacement skills.
    pub alternate_passive_skills: Vec<AlternatePassiveSkill>,
    /// Alternate addition rolls.
    pub alternate_passive_additions: Vec<AlternatePassiveAddition>,
    /// Stat semantics keyed by stat id.
    pub semantics: BTreeMap<String, Vec<StatSemantic>>,
}

/// The tree and skill table a snapshot works against.
#[derive(Debug, Clone, Copy)]
pub struct TreeAccess<'a> {
    /// Graph definition.
    pub tree: &'a TreeDefinition,
    /// Skill table.
    pub skills: &'a BTreeMap<String, SkillDefinition>,
}

impl TreeAccess<'_> {
    /// Skill of a catalog node.
    pub fn skill(&self, id: NodeId) -> Option<&SkillDefinition> {
        let node = self.tree.nodes.get(&id)?;
        skill_of(node, self.skills)
    }
}

impl Catalog {
    /// Decodes a catalog from JSON.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Selects the passive or atlas tree of `version`.
    pub fn tree(&self, version: u32, atlas: bool) -> Result<TreeAccess<'_>, CatalogError> {
        let data = self
            .trees
            .get(&version)
            .ok_or(CatalogError::UnknownVersion(version))?;
        let tree = if atlas {
            data.atlas_passive_tree
                .as_ref()
                .ok_or(CatalogError::MissingAtlasTree(version))?
        } else {
            &data.passive_tree
        };
        let skills = data.passive_skills.as_ref().unwrap_or(&self.passive_skills);
        Ok(TreeAccess { tree, skills })
    }

    /// Radius table row for a 1-based reference.
    pub(crate) fn jewel_radius(&self, index: usize) -> Option<&JewelRadius> {
        index.checked_sub(1).and_then(|i| self.jewel_radii.get(i))
    }
}
