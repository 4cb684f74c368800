// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Jewel-driven stat mutation.
//!
//! Jewels change nodes in two ways: per-node mutations declared on the jewel's
//! stat semantics, and aggregate bonuses the socket itself derives from the
//! nodes in its radius.
use crate::catalog::{
    BonusSource, Catalog, MutationSource, NodeSize, SkillDefinition, StatSemantic, TreeBonus,
    TreeMutation, TreeNodeFilter, JEWEL_TREE_TRANSFORM,
};
use crate::ident::NodeId;
use crate::item::Item;
use crate::radius::radius_jewel;
use crate::realize::TreeData;
use crate::stats::{stats_extend, Stats};
use crate::timeless::{mutate_timeless, TimelessSeed};

const ALTERNATE_TREE_JEWEL: &str = "local_is_alternate_tree_jewel";

fn filter_node(filter: &TreeNodeFilter, active: bool, skill: &SkillDefinition) -> bool {
    if filter.allocated.is_some_and(|allocated| allocated != active) {
        return false;
    }
    match filter.size {
        Some(NodeSize::Small) => !skill.is_notable && !skill.is_keystone,
        Some(NodeSize::Notable) => skill.is_notable && !skill.is_keystone,
        Some(NodeSize::Keystone) => skill.is_keystone,
        Some(NodeSize::NonKeystone) => !skill.is_keystone,
        Some(NodeSize::Tattoo) => false,
        None => true,
    }
}

fn add(stats: &mut Stats, id: &str, amount: f64) {
    *stats.entry(id.to_owned()).or_insert(0.0) += amount;
}

#[derive(Default)]
struct Mutation {
    added: Stats,
    disabled: bool,
}

impl Mutation {
    fn apply(&mut self, op: &TreeMutation, value: f64, active: bool, skill: &SkillDefinition) {
        match op {
            TreeMutation::Disable { filter } => {
                if filter_node(filter, active, skill) {
                    self.disabled = true;
                }
            }
            TreeMutation::Stat {
                id,
                value: fixed,
                factor,
                filter,
            } => {
                if filter_node(filter, active, skill) {
                    add(&mut self.added, id, fixed.unwrap_or(value) * factor.unwrap_or(1.0));
                }
            }
            TreeMutation::Convert {
                source,
                percent,
                filter,
            }
            | TreeMutation::Add {
                source,
                percent,
                filter,
            } => {
                if !filter_node(filter, active, skill) {
                    return;
                }
                let convert = matches!(op, TreeMutation::Convert { .. });
                let scale = 1.0 + 0.01 * percent.map_or(0.0, |p| p.resolve(value));
                let mut transfer = |from: &str, to: &str, amount: f64| {
                    add(&mut self.added, to, amount * scale);
                    if convert {
                        add(&mut self.added, from, -amount);
                    }
                };
                match source {
                    MutationSource::Single { from, to } => {
                        if let Some(&amount) = skill.stats.get(from).filter(|v| **v != 0.0) {
                            transfer(from, to, amount);
                        }
                    }
                    MutationSource::Map { map } => {
                        for (from, &amount) in &skill.stats {
                            if let Some(to) = map.get(from) {
                                transfer(from, to, amount);
                            }
                        }
                    }
                }
            }
            TreeMutation::Amplify { percent, filter } => {
                if filter_node(filter, active, skill) {
                    let scale = 0.01 * percent.resolve(value);
                    for (id, amount) in &skill.stats {
                        add(&mut self.added, id, amount * scale);
                    }
                }
            }
        }
    }
}

/// Applies the per-node effects of `jewels` to `skill`.
///
/// `original` is the node's catalog skill; timeless jewels classify the node
/// by it rather than by an attribute choice.
pub fn mutate_tree_skill(
    catalog: &Catalog,
    id: NodeId,
    active: bool,
    skill: &SkillDefinition,
    original: &SkillDefinition,
    jewels: &[&Item],
) -> SkillDefinition {
    if let Some(jewel) = jewels
        .iter()
        .find(|jewel| jewel.unique_stat(ALTERNATE_TREE_JEWEL).is_some())
    {
        return TimelessSeed::from_item(jewel).map_or_else(
            || skill.clone(),
            |seed| mutate_timeless(catalog, id, skill, original, &seed),
        );
    }

    let mut mutation = Mutation::default();
    for jewel in jewels {
        for (stat, &value) in jewel.stats.values().flatten() {
            let Some(semantics) = catalog.semantics.get(stat) else { continue };
            for op in semantics.iter().flat_map(|semantic| &semantic.tree_mutation) {
                mutation.apply(op, value, active, skill);
            }
        }
    }

    if mutation.disabled {
        return skill.emptied();
    }
    if mutation.added.is_empty() {
        return skill.clone();
    }
    let mut stats = mutation.added;
    stats_extend(&mut stats, [&skill.stats]);
    SkillDefinition {
        stats,
        ..skill.clone()
    }
}

fn transform_semantic(semantics: &[StatSemantic]) -> Option<&StatSemantic> {
    match semantics {
        [single] if single.stat.as_deref() == Some(JEWEL_TREE_TRANSFORM) => Some(single),
        _ => None,
    }
}

fn apply_bonus(
    data: &TreeData<'_>,
    nodes: &[NodeId],
    bonus: &TreeBonus,
    jewel_value: f64,
    stats: &mut Stats,
) {
    let mut total = Stats::new();
    total.insert("node_count".to_owned(), 0.0);
    for &id in nodes {
        let Some(node) = data.node(id) else { continue };
        if !filter_node(&bonus.filter, node.active, &node.skill) {
            continue;
        }
        if let Some(skill) = data.node_skill(id) {
            stats_extend(&mut total, [&skill.stats]);
        }
        add(&mut total, "node_count", 1.0);
    }

    if bonus.from.is_any() {
        stats_extend(stats, [&total]);
        return;
    }
    let source = |id: &str| total.get(id).copied().unwrap_or(0.0);
    let value = match &bonus.from {
        BonusSource::Many(ids) => ids.iter().map(|id| source(id)).sum::<f64>(),
        BonusSource::One(id) => source(id),
    };
    let amount = bonus.value.unwrap_or(jewel_value);
    if let Some(threshold) = bonus.threshold {
        if value >= threshold.resolve(jewel_value) {
            add(stats, &bonus.to, amount);
        }
    } else if let Some(divisor) = bonus.divisor {
        let divisor = divisor.resolve(jewel_value);
        if divisor > 0.0 && value >= divisor {
            add(stats, &bonus.to, amount * (value / divisor).floor());
        }
    } else if value != 0.0 {
        add(stats, &bonus.to, amount * value);
    }
}

/// Stats the jewel socketed in `id` contributes, with aggregate bonuses
/// computed over the nodes in its radius.
///
/// Stats without an aggregate semantic are passed through unchanged.
pub fn calculate_jewel_stats(data: &TreeData<'_>, id: NodeId) -> Stats {
    let mut stats = Stats::new();
    let Some(jewel) = data.node(id).and_then(|node| node.jewel) else {
        return stats;
    };
    let nodes = radius_jewel(data, id, false).map(|radius| data.nodes_in_radius(&radius));
    let catalog = data.catalog();

    for (stat, &value) in jewel.stats.values().flatten() {
        let transform = catalog
            .semantics
            .get(stat)
            .and_then(|semantics| transform_semantic(semantics));
        match transform {
            None => add(&mut stats, stat, value),
            Some(semantic) => {
                let Some(nodes) = &nodes else { continue };
                for bonus in &semantic.tree_bonus {
                    apply_bonus(data, nodes, bonus, value, &mut stats);
                }
            }
        }
    }
    stats
}
