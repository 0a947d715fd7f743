// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::Harness;
use proptest::{collection::vec, prelude::*, sample::select};
use std::collections::HashMap;
use test_strategy::proptest;
use triage_engine::{config::MonitorConfig, events::LifecycleEvent};

const TESTS: &[&str] = &["a/one", "a/two", "a/b/three", "b/four", "five"];

const CATEGORIES: &[&str] = &["", "crash", "killed", "bug", "badPredict", "unrunnable"];

const DETAILS: &[&str] = &[
    "",
    "3% slower",
    "1% faster, 1 different file",
    "10% larger, 2 smaller",
    "3 different(+) files",
    "output missing",
    "errors new",
    "no results",
    "SIGSEGV",
];

const NODES: &[&str] = &[
    "Pending",
    "Running",
    "Succeeded",
    "Failed",
    "Failed/Performance differences",
    "Failed/Crashed",
    "failed.unrunnable",
    "failed.unrunnable.killed",
];

fn arb_event() -> impl Strategy<Value = LifecycleEvent> {
    (
        select(TESTS),
        select(CATEGORIES),
        select(DETAILS),
        any::<[bool; 4]>(),
    )
        .prop_map(|(test, category, detail, flags)| {
            let [has_started, is_complete, has_succeeded, has_failed] = flags;
            LifecycleEvent {
                category: category.to_owned(),
                detail: detail.to_owned(),
                has_started,
                is_complete,
                has_succeeded,
                has_failed,
                ..LifecycleEvent::not_started(test)
            }
        })
}

fn arb_toggle() -> impl Strategy<Value = (&'static str, bool)> {
    (select(NODES), any::<bool>())
}

fn config() -> MonitorConfig {
    MonitorConfig::from_toml_str(r#"custom_crash_errors = ["SIGSEGV{SegFault}"]"#)
        .expect("config is valid")
}

fn check_counts(harness: &Harness) -> Result<(), TestCaseError> {
    let mut expected: HashMap<String, usize> = HashMap::new();
    let tree = harness.monitor.categories();
    for (_, entry) in harness.monitor.tests() {
        for &node in entry.path() {
            *expected.entry(tree.node(node).id().to_owned()).or_default() += 1;
        }
    }
    for (id, count) in harness.counts() {
        prop_assert_eq!(
            count,
            expected.get(&id).copied().unwrap_or(0),
            "count for {}",
            id
        );
    }
    Ok(())
}

#[proptest]
fn counts_match_stored_paths(#[strategy(vec(arb_event(), 0..64))] events: Vec<LifecycleEvent>) {
    let mut harness = Harness::new(config(), TESTS);
    for event in events {
        harness.apply(event);
        check_counts(&harness)?;
    }

    let stats = harness.monitor.stats();
    prop_assert_eq!(
        stats.pending + stats.running + stats.succeeded + stats.failed,
        stats.total
    );
    prop_assert_eq!(stats.total, TESTS.len());
}

#[proptest]
fn visibility_follows_owner(
    #[strategy(vec(arb_event(), 0..32))] events: Vec<LifecycleEvent>,
    #[strategy(vec(arb_toggle(), 1..8))] toggles: Vec<(&'static str, bool)>,
) {
    let mut harness = Harness::new(config(), TESTS);
    for event in events {
        harness.apply(event);
    }
    let counts = harness.counts();

    for (node, visible) in toggles {
        harness.toggle(node, visible);
        for test in TESTS {
            // test_visible also checks that the suite tree agrees with the monitor.
            let shown = harness.test_visible(test);
            let owner_visible = harness
                .monitor
                .owner_of(&(*test).into())
                .map(|node| node.is_visible());
            prop_assert_eq!(Some(shown), owner_visible, "visibility of {}", test);
        }
    }
    prop_assert_eq!(harness.counts(), counts, "toggles never change counts");
}
