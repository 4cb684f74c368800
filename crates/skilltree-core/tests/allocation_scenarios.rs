// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
mod common;

use std::collections::BTreeMap;

use common::{
    allocated, chain, choice_option, choice_parent, editing, props, small, socket, view, Items,
    TreeFixture, A, B, C, N, R,
};
use skilltree_core::{
    allocate_path, history_next_position, history_prev_position, radius_jewel, toggle_node,
    Catalog,
    HistoryStep, Item, JewelRadius, NodeAction, NodeId, NodeState, RespecAction, TreeData,
    TreeEditingState, UniqueDefinition,
};

const LEAP: &str = "local_unique_jewel_nearby_disconnected_passives_can_be_allocated";
const RING: &str = "local_jewel_variable_ring_radius_value";

fn toggle(
    catalog: &Catalog,
    src: &TreeEditingState,
    id: NodeId,
    items: &Items,
) -> TreeEditingState {
    toggle_node(catalog, &props(), src, id, items, None).expect("toggle")
}

#[test]
fn toggling_a_notable_allocates_the_path_and_back() {
    let catalog = chain();
    let items = Items::new();

    let grown = toggle(&catalog, &TreeEditingState::default(), N, &items);
    assert_eq!(grown.history, vec![HistoryStep::Id(A), HistoryStep::Id(N)]);
    assert_eq!(grown.position, 2);
    let snapshot = view(&catalog, &props(), &grown, &items);
    assert_eq!(allocated(&snapshot), vec![A, N]);
    assert_eq!(snapshot.count.normal, 2);

    let cut = toggle(&catalog, &grown, A, &items);
    assert!(cut.history.is_empty());
    assert_eq!(cut.position, 0);
}

#[test]
fn removing_a_node_sweeps_its_dependents() {
    let catalog = chain();
    let items = Items::new();
    let src = editing(vec![
        HistoryStep::Id(A),
        HistoryStep::Id(B),
        HistoryStep::Id(C),
        HistoryStep::Id(N),
    ]);

    let data_view = view(&catalog, &props(), &src, &items);
    let data = TreeData::new(&catalog, &data_view, &items).expect("tree");
    assert_eq!(skilltree_core::disconnected_nodes(&data, &[B]), vec![B, C]);

    let next = toggle(&catalog, &src, B, &items);
    assert_eq!(next.history, vec![HistoryStep::Id(A), HistoryStep::Id(N)]);
}

#[test]
fn class_start_cannot_be_toggled() {
    let catalog = chain();
    let items = Items::new();
    let src = TreeEditingState::default();
    assert_eq!(toggle(&catalog, &src, R, &items), src);
    assert_eq!(toggle(&catalog, &src, 404, &items), src);
}

fn ring_catalog() -> Catalog {
    const S: NodeId = 10;
    TreeFixture::new()
        .root(R, (0.0, 0.0))
        .node(S, (0.0, 100.0), socket())
        .node(11, (500.0, 100.0), small("Distant"))
        .node(12, (1500.0, 100.0), small("Too Far"))
        .link(R, S)
        .link(11, 12)
        .with_catalog(|catalog| {
            catalog.jewel_radii = vec![JewelRadius {
                radius: 800.0,
                ring_inner: 0.0,
                ring_outer: 800.0,
            }];
            catalog.uniques.insert(
                "Leaper".into(),
                UniqueDefinition {
                    jewel_radius: Some(1),
                },
            );
        })
        .build()
}

fn leap_jewel() -> Item {
    leap_jewel_with_ring(1.0)
}

fn leap_jewel_with_ring(ring: f64) -> Item {
    let mut item = Item {
        base: "Crimson Jewel".into(),
        unique: Some("Leaper".into()),
        ..Item::default()
    };
    item.stats.insert(
        "unique".into(),
        [(LEAP.to_owned(), 1.0), (RING.to_owned(), ring)]
            .into_iter()
            .collect(),
    );
    item
}

#[test]
fn leap_jewel_allows_disconnected_allocation_inside_its_ring() {
    let catalog = ring_catalog();
    let items: Items = BTreeMap::from([(1, leap_jewel())]);
    let src = TreeEditingState {
        jewels: BTreeMap::from([(10, 1)]),
        ..editing(vec![HistoryStep::Id(10)])
    };

    let snapshot = view(&catalog, &props(), &src, &items);
    let data = TreeData::new(&catalog, &snapshot, &items).expect("tree");
    let action = allocate_path(&data, 11).expect("covered by the leap");
    assert_eq!(action.add, vec![NodeAction::Id(11)]);
    assert!(allocate_path(&data, 12).is_none());

    let leapt = toggle(&catalog, &src, 11, &items);
    assert_eq!(leapt.history, vec![HistoryStep::Id(10), HistoryStep::Id(11)]);

    // pulling the socket orphans the leapt node
    let pulled = toggle(&catalog, &leapt, 10, &items);
    assert!(pulled.history.is_empty());
}

#[test]
fn unknown_ring_index_resolves_no_radius() {
    let catalog = ring_catalog();
    let items: Items = BTreeMap::from([(1, leap_jewel_with_ring(5.0))]);
    let src = TreeEditingState {
        jewels: BTreeMap::from([(10, 1)]),
        ..editing(vec![HistoryStep::Id(10)])
    };

    let snapshot = view(&catalog, &props(), &src, &items);
    let data = TreeData::new(&catalog, &snapshot, &items).expect("tree");
    assert!(radius_jewel(&data, 10, false).is_none());
    assert!(allocate_path(&data, 11).is_none());
    assert_eq!(toggle(&catalog, &src, 11, &items), src);
}

const M: NodeId = 6;
const O1: NodeId = 7;
const O2: NodeId = 8;
const X: NodeId = 9;

fn choice_catalog() -> Catalog {
    TreeFixture::new()
        .root(R, (0.0, 0.0))
        .node(M, (100.0, 0.0), choice_parent("Choice"))
        .node(O1, (200.0, 0.0), choice_option("First"))
        .node(O2, (200.0, 100.0), choice_option("Second"))
        .node(X, (0.0, 100.0), small("Elsewhere"))
        .link(M, O1)
        .link(M, O2)
        .link(R, M)
        .link(R, X)
        .build()
}

#[test]
fn options_store_without_their_parent_and_swap_in_place() {
    let catalog = choice_catalog();
    let items = Items::new();

    let first = toggle(&catalog, &TreeEditingState::default(), O1, &items);
    assert_eq!(first.history, vec![HistoryStep::Id(O1)]);
    let snapshot = view(&catalog, &props(), &first, &items);
    assert_eq!(allocated(&snapshot), vec![M, O1]);
    assert_eq!(snapshot.count.normal, 1);

    let swapped = toggle(&catalog, &first, O2, &items);
    assert_eq!(swapped.history, vec![HistoryStep::Id(O2)]);
    let snapshot = view(&catalog, &props(), &swapped, &items);
    assert_eq!(allocated(&snapshot), vec![M, O2]);
}

#[test]
fn buried_option_swaps_through_a_respec_step() {
    let catalog = choice_catalog();
    let items = Items::new();
    let src = editing(vec![HistoryStep::Id(O1), HistoryStep::Id(X)]);

    let swapped = toggle(&catalog, &src, O2, &items);
    assert_eq!(
        swapped.history,
        vec![
            HistoryStep::Id(O1),
            HistoryStep::Id(X),
            HistoryStep::Respec(RespecAction {
                add: vec![NodeAction::Id(O2)],
                remove: vec![O1],
            }),
        ]
    );
    let snapshot = view(&catalog, &props(), &swapped, &items);
    assert_eq!(allocated(&snapshot), vec![M, O2, X]);
}

#[test]
fn weapon_set_nodes_are_tagged() {
    let catalog = chain();
    let items = Items::new();
    let src = TreeEditingState {
        active_set: 2,
        ..TreeEditingState::default()
    };
    let next = toggle(&catalog, &src, A, &items);
    assert_eq!(next.history, vec![HistoryStep::Tagged { id: A, set: 2 }]);

    let snapshot = view(&catalog, &props(), &next, &items);
    let packed = snapshot.packed(A);
    assert_eq!(packed.state(), NodeState::Active);
    assert_eq!(packed.weapon_set(), 2);
    assert_eq!(snapshot.count.weapon_set, [0, 1, 0]);
}

#[test]
fn navigation_skips_over_chained_steps() {
    let catalog = chain();
    let items = Items::new();
    let src = editing(vec![
        HistoryStep::Id(A),
        HistoryStep::Id(B),
        HistoryStep::Id(C),
        HistoryStep::Id(N),
    ]);
    let next = |position| {
        history_next_position(&catalog, &props(), &src, position, &items).expect("nav")
    };
    let prev = |position| {
        history_prev_position(&catalog, &props(), &src, position, &items).expect("nav")
    };

    assert_eq!(next(1), 3);
    assert_eq!(next(0), 0);
    assert_eq!(prev(3), 0);
    assert_eq!(prev(4), 4);

    let respec = editing(vec![
        HistoryStep::Respec(RespecAction::default()),
        HistoryStep::Id(A),
    ]);
    assert_eq!(
        history_prev_position(&catalog, &props(), &respec, 1, &items).expect("nav"),
        1
    );
}
