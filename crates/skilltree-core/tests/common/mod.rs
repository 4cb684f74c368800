// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use std::collections::BTreeMap;

use skilltree_core::{
    tree_view_state, Catalog, Connection, Group, Item, ItemId, NodeCount, NodeId,
    PassiveTreeConfig, SkillDefinition, SkillRef, TreeDefinition, TreeEditingState, TreeNode,
    TreeProperties, TreeVariant, TreeVersionData, TreeViewState,
};

/// Catalog version every fixture is registered under.
pub const VERSION: u32 = 1;

/// Class whose start node is the fixture root.
pub const CLASS: &str = "Witch";

/// Item store used by fixtures.
pub type Items = BTreeMap<ItemId, Item>;

/// Hand-built single-version catalog.
///
/// Every node sits alone at the center of its own group (orbit 0), so its
/// position is exactly the coordinates it was declared with.
#[derive(Default)]
pub struct TreeFixture {
    tree: TreeDefinition,
    skills: BTreeMap<String, SkillDefinition>,
    catalog: Catalog,
}

impl TreeFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds node `id` at `(x, y)` with `skill`.
    pub fn node(mut self, id: NodeId, at: (f64, f64), skill: SkillDefinition) -> Self {
        self.node_in(id, id, at, skill);
        self
    }

    /// Adds node `id` into group `group` (created on first use at `at`).
    pub fn node_in(&mut self, id: NodeId, group: u32, at: (f64, f64), skill: SkillDefinition) {
        let key = format!("s{id}");
        self.skills.insert(key.clone(), skill);
        let entry = self.tree.groups.entry(group).or_insert_with(|| Group {
            x: at.0,
            y: at.1,
            ..Group::default()
        });
        entry.nodes.push(id);
        self.tree.nodes.insert(
            id,
            TreeNode {
                parent: group,
                radius: 0,
                position: 0,
                connections: Vec::new(),
                skill: SkillRef::Id { skill_id: key },
            },
        );
    }

    /// Class start node.
    pub fn root(mut self, id: NodeId, at: (f64, f64)) -> Self {
        self.tree.character_root.insert(CLASS.to_owned(), id);
        self.node(
            id,
            at,
            SkillDefinition {
                name: "Seven Years Bad Luck".into(),
                starting_node: vec![CLASS.to_owned()],
                ..SkillDefinition::default()
            },
        )
    }

    /// Two-way edge; each endpoint lists the other after its existing edges.
    pub fn link(mut self, a: NodeId, b: NodeId) -> Self {
        for (from, to) in [(a, b), (b, a)] {
            if let Some(node) = self.tree.nodes.get_mut(&from) {
                node.connections.push(Connection::to(to));
            }
        }
        self
    }

    /// Cluster proxy node alone in a proxy group.
    pub fn proxy(mut self, id: NodeId, at: (f64, f64)) -> Self {
        self.node_in(
            id,
            id,
            at,
            SkillDefinition {
                name: "Small Jewel Socket".into(),
                is_proxy: true,
                ..SkillDefinition::default()
            },
        );
        if let Some(group) = self.tree.groups.get_mut(&id) {
            group.proxy = true;
        }
        self
    }

    /// Edits the catalog tables outside the tree.
    pub fn with_catalog(mut self, edit: impl FnOnce(&mut Catalog)) -> Self {
        edit(&mut self.catalog);
        self
    }

    pub fn build(self) -> Catalog {
        let mut catalog = self.catalog;
        catalog.trees.insert(
            VERSION,
            TreeVersionData {
                passive_tree: self.tree,
                atlas_passive_tree: None,
                passive_skills: Some(self.skills),
            },
        );
        catalog
    }
}

pub fn small(name: &str) -> SkillDefinition {
    SkillDefinition {
        name: name.to_owned(),
        stats: [("base_maximum_life".to_owned(), 10.0)].into_iter().collect(),
        ..SkillDefinition::default()
    }
}

pub fn notable(name: &str) -> SkillDefinition {
    SkillDefinition {
        name: name.to_owned(),
        is_notable: true,
        stats: [("maximum_life_+%".to_owned(), 8.0)].into_iter().collect(),
        ..SkillDefinition::default()
    }
}

pub fn socket() -> SkillDefinition {
    SkillDefinition {
        name: "Jewel Socket".into(),
        is_jewel_socket: true,
        ..SkillDefinition::default()
    }
}

pub fn choice_parent(name: &str) -> SkillDefinition {
    SkillDefinition {
        name: name.to_owned(),
        is_multiple_choice: true,
        ..SkillDefinition::default()
    }
}

pub fn choice_option(name: &str) -> SkillDefinition {
    SkillDefinition {
        name: name.to_owned(),
        is_multiple_choice_option: true,
        ..SkillDefinition::default()
    }
}

pub fn props() -> TreeProperties {
    TreeProperties {
        version: VERSION,
        read_only: false,
        show_hidden_nodes: false,
        limit: None,
        variant: TreeVariant::Passive(PassiveTreeConfig {
            char_class: CLASS.to_owned(),
            ascendancy: None,
            ascendancy_only: false,
        }),
    }
}

pub fn limited(normal: i32) -> TreeProperties {
    TreeProperties {
        limit: Some(NodeCount {
            normal,
            ..NodeCount::passive_default()
        }),
        ..props()
    }
}

pub fn editing(history: Vec<skilltree_core::HistoryStep>) -> TreeEditingState {
    TreeEditingState {
        position: history.len(),
        history,
        ..TreeEditingState::default()
    }
}

pub fn view(catalog: &Catalog, props: &TreeProperties, src: &TreeEditingState, items: &Items) -> TreeViewState {
    tree_view_state(catalog, props, src, items).expect("fixture version exists")
}

/// Allocated ids of a snapshot.
pub fn allocated(view: &TreeViewState) -> Vec<NodeId> {
    view.nodes
        .iter()
        .filter(|(_, packed)| packed.is_set())
        .map(|(&id, _)| id)
        .collect()
}

/// `R - A - N` plus a branch `A - B - C`.
///
/// R is the class start; N is a notable.
pub const R: NodeId = 1;
pub const A: NodeId = 2;
pub const N: NodeId = 3;
pub const B: NodeId = 4;
pub const C: NodeId = 5;

pub fn chain() -> Catalog {
    TreeFixture::new()
        .root(R, (0.0, 0.0))
        .node(A, (100.0, 0.0), small("Life"))
        .node(N, (200.0, 0.0), notable("Heart of Oak"))
        .node(B, (100.0, 100.0), small("Life"))
        .node(C, (100.0, 200.0), small("Life"))
        .link(R, A)
        .link(A, N)
        .link(A, B)
        .link(B, C)
        .build()
}
