// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Build-level helpers over whole variants.
use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Catalog, CatalogError, TreeAccess};
use crate::history::{validate_history, HistoryStep};
use crate::ident::{ItemId, NodeId};
use crate::item::ItemStore;
use crate::state::{TreeEditingState, TreeProperties};

/// One saved variant of a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildVariant {
    /// Edit log.
    pub history: Vec<HistoryStep>,
    /// Mastery selections.
    pub masteries: BTreeMap<NodeId, u32>,
    /// Socketed jewels.
    pub jewels: BTreeMap<NodeId, ItemId>,
    /// Attribute choice per node.
    pub attributes: BTreeMap<NodeId, usize>,
}

/// Re-validates every variant's history from an empty tree.
///
/// Variants without an explicit budget get the default one for their tree.
/// Returns the rewritten variants and whether any history changed.
pub fn validate_variants(
    catalog: &Catalog,
    props: &TreeProperties,
    variants: &[BuildVariant],
    items: &dyn ItemStore,
) -> Result<(Vec<BuildVariant>, bool), CatalogError> {
    let props = TreeProperties {
        limit: Some(
            props
                .limit
                .clone()
                .unwrap_or_else(|| props.variant.default_limit()),
        ),
        ..props.clone()
    };
    let mut changed = false;
    let mut validated = Vec::with_capacity(variants.len());
    for (index, variant) in variants.iter().enumerate() {
        let start = TreeEditingState {
            masteries: variant.masteries.clone(),
            jewels: variant.jewels.clone(),
            attributes: variant.attributes.clone(),
            ..TreeEditingState::default()
        };
        let history = validate_history(catalog, &props, &start, &variant.history, items)?;
        if history != variant.history {
            debug!(
                variant = index,
                before = variant.history.len(),
                after = history.len(),
                "variant history rewritten"
            );
            changed = true;
        }
        validated.push(BuildVariant {
            history,
            ..variant.clone()
        });
    }
    Ok((validated, changed))
}

/// Quest rewards: (level, points).
const QUEST_POINTS: [(u32, i32); 10] = [
    (8, 1),
    (11, 1),
    (17, 1),
    (23, 1),
    (27, 1),
    (31, 1),
    (37, 1),
    (40, 1),
    (42, 1),
    (61, 1),
];

/// Levels at which several quests reward points at once.
const QUEST_BUNDLES: [(u32, i32); 5] = [(44, 2), (48, 3), (52, 2), (60, 3), (62, 2)];

/// Passive points available at `level`, counting every quest reward.
///
/// `bandits == Some("all")` adds the two points for killing every bandit.
pub fn points_from_level(level: u32, bandits: Option<&str>) -> i32 {
    let mut points = level.saturating_sub(1) as i32;
    for (at, reward) in QUEST_POINTS.iter().chain(&QUEST_BUNDLES) {
        if level >= *at {
            points += reward;
        }
    }
    if level >= 17 && bandits == Some("all") {
        points += 2;
    }
    points
}

struct LevelBudget {
    points: i32,
    limit: i32,
}

impl LevelBudget {
    fn count(&mut self, access: TreeAccess<'_>, id: NodeId, factor: i32) {
        let Some(skill) = access.skill(id) else {
            self.points += factor;
            return;
        };
        if skill.is_multiple_choice {
            return;
        }
        self.limit += skill.skill_points * factor;
        if skill.ascendancy.is_none() {
            self.points += factor;
        }
    }
}

/// History position a character of `level` can afford.
///
/// Walks the log until the spent non-ascendancy points reach the points
/// available at that level; the returned position includes the step that
/// reached it.
pub fn level_position(
    catalog: &Catalog,
    version: u32,
    variant: &BuildVariant,
    level: u32,
    bandits: Option<&str>,
) -> Result<usize, CatalogError> {
    let access = catalog.tree(version, false)?;
    let mut budget = LevelBudget {
        points: 0,
        limit: points_from_level(level, bandits),
    };
    let mut nodes = FxHashSet::default();
    let mut position = 0;
    for step in &variant.history {
        position += 1;
        match step {
            HistoryStep::Respec(respec) => {
                for &id in &respec.remove {
                    if nodes.remove(&id) {
                        budget.count(access, id, -1);
                    }
                }
                for action in &respec.add {
                    if nodes.insert(action.id()) {
                        budget.count(access, action.id(), 1);
                    }
                }
            }
            HistoryStep::Id(id) | HistoryStep::Tagged { id, .. } => {
                if nodes.insert(*id) {
                    budget.count(access, *id, 1);
                }
            }
        }
        if budget.points >= budget.limit {
            break;
        }
    }
    Ok(position)
}
