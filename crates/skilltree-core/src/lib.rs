// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! skilltree-core: allocation engine for graph-shaped skill trees.
//!
//! The engine turns a compact edit history into an authoritative tree
//! snapshot. Every query is a pure function over the read-only [`Catalog`],
//! an [`ItemStore`] and a [`TreeViewState`]; realised node views are memoised
//! per [`TreeData`] instance and never shared across snapshots.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]

/// Deterministic math used by the reroll engine.
pub mod math;

mod build;
mod catalog;
mod cluster;
mod connectivity;
mod history;
mod ident;
mod item;
mod mutation;
mod orbit;
mod pathing;
mod radius;
mod realize;
mod state;
mod stats;
mod timeless;

/// Build-level helpers: variant validation and level-gated history positions.
pub use build::{level_position, points_from_level, validate_variants, BuildVariant};
/// Static catalog shape and loader.
pub use catalog::{
    skill_of, AlternatePassiveAddition, AlternatePassiveSkill, AlternateTreeVersion,
    AuraDefinition, BonusParam, BonusSource, Catalog, CatalogError, ClusterJewelBase,
    ClusterJewelSize, ClusterNotable, ClusterSkill, Connection, Group, ItemBase, JewelRadius,
    JewelSlot, JewelValue, MasteryDefinition, MutationSource, NodeSize, SkillDefinition,
    SkillRef, StatRange, StatSemantic, TreeAccess, TreeBonus, TreeDefinition, TreeMutation,
    TreeNode, TreeNodeFilter, TreeVersionData, UniqueDefinition,
};
/// Cluster jewel projection.
pub use cluster::{cluster_data, ClusterData, ClusterLayout};
/// Breadth-first reachability and leap coverage.
pub use connectivity::{connected_nodes, has_leap, leap_jewels, Connected, NodeStates};
/// History replay, append and navigation.
pub use history::{
    count_nodes, history_next_position, history_nodes, history_prev_position, light_state,
    modify_history, toggle_node, toggle_recording, tree_view_state, validate_history,
    HistoryStep, NodeAction, NodeTotals, RespecAction,
};
/// Identifier types and reserved id ranges.
pub use ident::{ItemId, NodeId, CLUSTER_NODE_BASE};
/// Socketed item model.
pub use item::{ClusterJewelRoll, Item, ItemStore};
/// Jewel-driven stat mutation.
pub use mutation::{calculate_jewel_stats, mutate_tree_skill};
/// Orbit geometry tables.
pub use orbit::{orbit_angle, orbit_position, OrbitPoint, ORBIT_RADII, SKILLS_PER_ORBIT};
/// Path allocation and disconnection sweep.
pub use pathing::{allocate_path, disconnected_nodes, toggle_action, TreeAction};
/// Jewel radius geometry.
pub use radius::{radius_jewel, RadiusJewel};
/// Graph realization over one snapshot.
pub use realize::{GroupView, NodeView, TotalStats, TreeData, ATTRIBUTE_SKILLS};
/// Snapshot, configuration and budget types.
pub use state::{
    check_limit, AtlasTreeConfig, NodeCount, NodeState, PackedState, PassiveTreeConfig,
    TreeEditingState, TreeProperties, TreeVariant, TreeViewState,
};
/// Stat bag helpers.
pub use stats::{stats_extend, stats_scale, Stats};
/// Timeless jewel reroll.
pub use timeless::{mutate_timeless, timeless_reroll, TimelessSeed};
