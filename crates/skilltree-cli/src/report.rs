// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Human-readable tables and machine-readable summaries.

use comfy_table::Table;
use serde::Serialize;
use skilltree_core::{NodeCount, NodeId, SkillDefinition, Stats, TreeAccess, TreeViewState};

/// `--json` form of the `state` command.
#[derive(Debug, Serialize)]
pub struct StateSummary {
    /// Catalog version.
    pub version: u32,
    /// Hex content digest of the snapshot.
    pub digest: String,
    /// Allocated node ids, ascending.
    pub allocated: Vec<NodeId>,
    /// Points in use.
    pub count: NodeCount,
    /// Effective budget.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<NodeCount>,
}

impl StateSummary {
    /// Summarises a snapshot.
    pub fn new(view: &TreeViewState) -> Self {
        Self {
            version: view.version,
            digest: hex::encode(view.digest()),
            allocated: view
                .nodes
                .iter()
                .filter(|(_, packed)| packed.is_set())
                .map(|(&id, _)| id)
                .collect(),
            count: view.count.clone(),
            limit: view.limit.clone(),
        }
    }
}

/// Non-default nodes of a snapshot with their names.
pub fn node_table(access: TreeAccess<'_>, view: &TreeViewState) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Node", "Name", "State", "Set"]);
    for (&id, packed) in &view.nodes {
        let name = access.skill(id).map_or("?", |skill| skill.name.as_str());
        table.add_row(vec![
            id.to_string(),
            name.to_owned(),
            format!("{:?}", packed.state()),
            packed.weapon_set().to_string(),
        ]);
    }
    table
}

/// Point usage next to the budget.
pub fn budget_table(count: &NodeCount, limit: Option<&NodeCount>) -> Table {
    let cap = |value: Option<i32>| value.map_or_else(|| "-".to_owned(), |v| v.to_string());
    let mut table = Table::new();
    table.set_header(vec!["Points", "Used", "Limit"]);
    table.add_row(vec![
        "normal".to_owned(),
        count.normal.to_string(),
        cap(limit.map(|l| l.normal)),
    ]);
    for (index, used) in count.weapon_set.iter().enumerate() {
        table.add_row(vec![
            format!("weapon set {}", index + 1),
            used.to_string(),
            cap(limit.map(|l| l.weapon_set[index])),
        ]);
    }
    table.add_row(vec![
        "ascendancy".to_owned(),
        count.ascendancy.to_string(),
        cap(limit.map(|l| l.ascendancy)),
    ]);
    let mut sub_trees: Vec<&String> = count.sub_trees.keys().collect();
    if let Some(limit) = limit {
        sub_trees.extend(limit.sub_trees.keys());
    }
    sub_trees.sort();
    sub_trees.dedup();
    for name in sub_trees {
        table.add_row(vec![
            name.clone(),
            count.sub_trees.get(name).copied().unwrap_or(0).to_string(),
            cap(limit.map(|l| l.sub_trees.get(name).copied().unwrap_or(0))),
        ]);
    }
    table
}

/// One rerolled node: id, catalog skill and the result.
pub struct RerollRow<'a> {
    /// Node id.
    pub id: NodeId,
    /// Catalog skill.
    pub original: &'a SkillDefinition,
    /// Skill after the reroll.
    pub rerolled: SkillDefinition,
}

/// Before/after view of rerolled nodes.
pub fn reroll_table(rows: &[RerollRow<'_>]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Node", "Name", "Rerolled", "Stats"]);
    for row in rows {
        table.add_row(vec![
            row.id.to_string(),
            row.original.name.clone(),
            row.rerolled.name.clone(),
            format_stats(&row.rerolled.stats),
        ]);
    }
    table
}

/// `id: value` pairs in key order.
pub fn format_stats(stats: &Stats) -> String {
    stats
        .iter()
        .map(|(id, value)| format!("{id}: {value}"))
        .collect::<Vec<_>>()
        .join(", ")
}
