// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
mod common;

use proptest::prelude::*;
use proptest::test_runner::{Config as PropConfig, RngAlgorithm, TestRng, TestRunner};

use common::{allocated, chain, editing, limited, props, view, Items, A, B, C, N, R};
use skilltree_core::{
    disconnected_nodes, level_position, modify_history, toggle_node, toggle_recording,
    validate_history, validate_variants, BuildVariant, Catalog, HistoryStep, NodeAction, NodeId,
    NodeState, RespecAction, TreeData, TreeEditingState, TreeProperties,
};

fn toggle_with(
    catalog: &Catalog,
    props: &TreeProperties,
    src: &TreeEditingState,
    id: NodeId,
) -> TreeEditingState {
    toggle_node(catalog, props, src, id, &Items::new(), None).expect("toggle")
}

fn ids(steps: &[NodeId]) -> Vec<HistoryStep> {
    steps.iter().copied().map(HistoryStep::Id).collect()
}

#[test]
fn budget_rejects_edits_that_overspend() {
    let catalog = chain();
    let props = limited(1);
    let src = TreeEditingState::default();

    assert_eq!(toggle_with(&catalog, &props, &src, N), src);

    let first = toggle_with(&catalog, &props, &src, A);
    assert_eq!(first.history, ids(&[A]));
    assert_eq!(toggle_with(&catalog, &props, &first, B), first);
}

#[test]
fn validation_truncates_at_the_budget() {
    let catalog = chain();
    let steps = ids(&[A, N, B, C]);
    let kept = validate_history(
        &catalog,
        &limited(2),
        &TreeEditingState::default(),
        &steps,
        &Items::new(),
    )
    .expect("validate");
    assert_eq!(kept, ids(&[A, N]));
}

#[test]
fn validation_drops_unreachable_and_duplicate_steps() {
    let catalog = chain();
    let steps = ids(&[N, A, A, 99, N]);
    let kept = validate_history(
        &catalog,
        &props(),
        &TreeEditingState::default(),
        &steps,
        &Items::new(),
    )
    .expect("validate");
    assert_eq!(kept, ids(&[A, N]));
}

#[test]
fn respec_steps_gain_removals_for_orphans() {
    let catalog = chain();
    let steps = vec![
        HistoryStep::Id(A),
        HistoryStep::Id(B),
        HistoryStep::Id(C),
        HistoryStep::Respec(RespecAction {
            add: vec![NodeAction::Id(N)],
            remove: vec![B],
        }),
    ];
    let kept = validate_history(
        &catalog,
        &props(),
        &TreeEditingState::default(),
        &steps,
        &Items::new(),
    )
    .expect("validate");
    assert_eq!(
        kept.last(),
        Some(&HistoryStep::Respec(RespecAction {
            add: vec![NodeAction::Id(N)],
            remove: vec![B, C],
        }))
    );
}

#[test]
fn hover_previews_the_toggle() {
    let catalog = chain();
    let items = Items::new();
    let hovering = TreeEditingState {
        hover: Some(N),
        ..TreeEditingState::default()
    };

    let open = view(&catalog, &props(), &hovering, &items);
    assert_eq!(open.packed(A).state(), NodeState::Add);
    assert_eq!(open.packed(N).state(), NodeState::Add);
    assert!(open.highlight.is_none());

    let tight = view(&catalog, &limited(1), &hovering, &items);
    assert_eq!(tight.packed(A).state(), NodeState::RemoveHistory);
    assert_eq!(tight.packed(N).state(), NodeState::RemoveHistory);

    let removing = TreeEditingState {
        hover: Some(A),
        ..editing(ids(&[A, N]))
    };
    let preview = view(&catalog, &props(), &removing, &items);
    assert_eq!(preview.packed(A).state(), NodeState::Remove);
    assert_eq!(preview.packed(N).state(), NodeState::Remove);

    let locked = TreeProperties {
        read_only: true,
        ..props()
    };
    let frozen = view(&catalog, &locked, &hovering, &items);
    assert!(allocated(&frozen).is_empty());
}

#[test]
fn start_position_shows_the_diff() {
    let catalog = chain();
    let items = Items::new();
    let grown = TreeEditingState {
        start_position: Some(1),
        ..editing(ids(&[A, N, B]))
    };
    let diff = view(&catalog, &props(), &grown, &items);
    assert_eq!(diff.packed(A).state(), NodeState::Active);
    assert_eq!(diff.packed(N).state(), NodeState::AddHistory);
    assert_eq!(diff.packed(B).state(), NodeState::AddHistory);

    let shrunk = TreeEditingState {
        start_position: Some(2),
        ..editing(vec![
            HistoryStep::Id(A),
            HistoryStep::Id(N),
            HistoryStep::Respec(RespecAction {
                add: Vec::new(),
                remove: vec![N],
            }),
        ])
    };
    let diff = view(&catalog, &props(), &shrunk, &items);
    assert_eq!(diff.packed(A).state(), NodeState::Active);
    assert_eq!(diff.packed(N).state(), NodeState::RemoveHistory);
    // removals in the diff do not spend points
    assert_eq!(diff.count.normal, 1);
}

#[test]
fn search_and_focus_highlight_nodes() {
    let catalog = chain();
    let items = Items::new();
    let search = |text: &str| {
        let src = TreeEditingState {
            search: Some(text.to_owned()),
            ..TreeEditingState::default()
        };
        view(&catalog, &props(), &src, &items).highlight
    };

    assert_eq!(search("oak"), Some(vec![N]));
    assert_eq!(search("LIFE"), Some(vec![A, N, B, C]));
    assert_eq!(search("seven years"), Some(Vec::new()));
    assert_eq!(search(""), None);
    assert_eq!(search("(unbalanced"), Some(Vec::new()));

    let focused = TreeEditingState {
        focus: Some(vec![B]),
        search: Some("oak".into()),
        ..TreeEditingState::default()
    };
    assert_eq!(view(&catalog, &props(), &focused, &items).highlight, Some(vec![B]));
}

#[test]
fn recording_groups_edits_into_one_respec() {
    let catalog = chain();
    let props = props();
    let start = editing(ids(&[A]));

    let recording = toggle_recording(&props, &start);
    assert!(recording.recording);
    assert_eq!(recording.position, 2);
    assert_eq!(
        recording.history,
        vec![HistoryStep::Id(A), HistoryStep::Respec(RespecAction::default())]
    );

    let with_n = toggle_with(&catalog, &props, &recording, N);
    let with_b = toggle_with(&catalog, &props, &with_n, B);
    assert_eq!(
        with_b.history,
        vec![
            HistoryStep::Id(A),
            HistoryStep::Respec(RespecAction {
                add: vec![NodeAction::Id(N), NodeAction::Id(B)],
                remove: Vec::new(),
            }),
        ]
    );

    // dropping N again cancels its pending addition
    let without_n = toggle_with(&catalog, &props, &with_b, N);
    assert_eq!(
        without_n.history[1],
        HistoryStep::Respec(RespecAction {
            add: vec![NodeAction::Id(B)],
            remove: Vec::new(),
        })
    );

    let stopped = toggle_recording(&props, &without_n);
    assert!(!stopped.recording);
    assert_eq!(stopped.history, without_n.history);
}

#[test]
fn editing_history_revalidates_the_tail() {
    let catalog = chain();
    let src = TreeEditingState {
        position: 1,
        edit_history: true,
        ..editing(ids(&[A, N, B]))
    };
    let next = toggle_with(&catalog, &props(), &src, B);
    assert_eq!(next.history, ids(&[A, B, N]));
    assert_eq!(next.position, 2);

    let discarding = TreeEditingState {
        edit_history: false,
        ..src
    };
    let next = toggle_with(&catalog, &props(), &discarding, B);
    assert_eq!(next.history, ids(&[A, B]));
}

#[test]
fn explicit_edits_swap_or_respec() {
    let catalog = chain();
    let items = Items::new();
    let src = editing(ids(&[A, B, C]));
    let edit = |add: &[NodeAction], remove: &[NodeId]| {
        modify_history(&catalog, &props(), &src, add, remove, &items).expect("modify")
    };

    // replacing the newest step rewrites it in place
    let swapped = edit(&[NodeAction::Id(N)], &[C]);
    assert_eq!(swapped.history, ids(&[A, B, N]));

    let respec = edit(&[NodeAction::Id(N)], &[C, B]);
    assert_eq!(
        respec.history.last(),
        Some(&HistoryStep::Respec(RespecAction {
            add: vec![NodeAction::Id(N)],
            remove: vec![C, B],
        }))
    );
    assert_eq!(respec.position, 4);
    assert_eq!(allocated(&view(&catalog, &props(), &respec, &items)), vec![A, N]);
}

#[test]
fn digest_ignores_step_order() {
    let catalog = chain();
    let items = Items::new();
    let digest =
        |steps: &[NodeId]| view(&catalog, &props(), &editing(ids(steps)), &items).digest();

    assert_eq!(digest(&[A, N, B]), digest(&[A, B, N]));
    assert_ne!(digest(&[A, N, B]), digest(&[A, N]));

    let mut moved = view(&catalog, &props(), &editing(ids(&[A])), &items);
    let before = moved.digest();
    moved.hover = Some(N);
    moved.highlight = Some(vec![N]);
    assert_eq!(moved.digest(), before);
    moved.active_set = 1;
    assert_ne!(moved.digest(), before);
}

#[test]
fn level_position_stops_where_points_run_out() {
    let catalog = chain();
    let variant = BuildVariant {
        history: ids(&[A, N, B, C]),
        ..BuildVariant::default()
    };
    let at = |level| {
        level_position(&catalog, common::VERSION, &variant, level, None).expect("level")
    };
    assert_eq!(at(2), 1);
    assert_eq!(at(3), 2);
    assert_eq!(at(90), 4);
    assert!(level_position(&catalog, 7, &variant, 2, None).is_err());
}

#[test]
fn variants_revalidate_under_the_default_budget() {
    let catalog = chain();
    let clean = BuildVariant {
        history: ids(&[A, N]),
        ..BuildVariant::default()
    };
    let dirty = BuildVariant {
        history: ids(&[N, A, N]),
        ..BuildVariant::default()
    };

    let (variants, changed) =
        validate_variants(&catalog, &props(), &[clean.clone()], &Items::new()).expect("variants");
    assert!(!changed);
    assert_eq!(variants, vec![clean.clone()]);

    let (variants, changed) =
        validate_variants(&catalog, &props(), &[clean.clone(), dirty], &Items::new())
            .expect("variants");
    assert!(changed);
    assert_eq!(variants[0], clean);
    assert_eq!(variants[1].history, ids(&[A, N]));
}

fn step_strategy() -> impl Strategy<Value = Vec<NodeId>> {
    prop::collection::vec(prop::sample::select(vec![A, N, B, C, 99]), 0..12)
}

/// Every node of a replayed snapshot is reachable from the class start.
fn fully_connected(catalog: &Catalog, src: &TreeEditingState) -> bool {
    let items = Items::new();
    let snapshot = view(catalog, &props(), src, &items);
    let data = TreeData::new(catalog, &snapshot, &items).expect("tree");
    disconnected_nodes(&data, &[]).is_empty()
}

proptest! {
    #[test]
    fn validation_is_idempotent(steps in step_strategy(), budget in prop::option::of(1i32..5)) {
        let catalog = chain();
        let items = Items::new();
        let props = budget.map_or_else(props, limited);
        let start = TreeEditingState::default();

        let once = validate_history(&catalog, &props, &start, &ids(&steps), &items)
            .expect("validate");
        let twice = validate_history(&catalog, &props, &start, &once, &items)
            .expect("validate");
        prop_assert_eq!(&once, &twice);
        prop_assert!(fully_connected(&catalog, &editing(once)));
    }

    #[test]
    fn toggles_keep_the_tree_connected(
        toggles in prop::collection::vec(prop::sample::select(vec![A, N, B, C]), 0..10)
    ) {
        let catalog = chain();
        let mut src = TreeEditingState::default();
        for id in toggles {
            src = toggle_with(&catalog, &props(), &src, id);
            prop_assert!(fully_connected(&catalog, &src));
        }
        let start = TreeEditingState::default();
        let replayed = validate_history(&catalog, &props(), &start, &src.history, &Items::new())
            .expect("validate");
        prop_assert_eq!(&replayed, &src.history);

        // removing the trunk clears everything
        if !src.history.is_empty() {
            let cleared = toggle_with(&catalog, &props(), &src, A);
            prop_assert!(cleared.history.is_empty());
        }
    }
}

#[test]
fn proptest_seed_pinned_toggle_round_trip() {
    const SEED_BYTES: [u8; 32] = [
        0x5e, 0xed, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0, 0,
    ];

    let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &SEED_BYTES);
    let mut runner = TestRunner::new_with_rng(PropConfig::default(), rng);
    let catalog = chain();

    runner
        .run(&prop::sample::select(vec![N, B, C]), |target| {
            let grown = toggle_with(&catalog, &props(), &TreeEditingState::default(), target);
            prop_assert_eq!(grown.history.first(), Some(&HistoryStep::Id(A)));
            prop_assert_eq!(grown.history.last(), Some(&HistoryStep::Id(target)));
            let snapshot = view(&catalog, &props(), &grown, &Items::new());
            prop_assert!(!allocated(&snapshot).contains(&R));

            let cut = toggle_with(&catalog, &props(), &grown, A);
            prop_assert!(cut.history.is_empty());
            Ok(())
        })
        .expect("proptest with pinned seed should complete");
}
