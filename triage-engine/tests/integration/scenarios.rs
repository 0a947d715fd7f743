// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::Harness;
use indoc::indoc;
use pretty_assertions::assert_eq;
use triage_engine::{
    config::{CustomCategorySpec, MonitorConfig},
    events::{LifecycleEvent, TestId, TestPhase},
    suite_tree::SuiteRowKind,
};

#[test]
fn slower_with_different_file() {
    let mut harness = Harness::new(MonitorConfig::default(), &["app/a"]);
    harness.apply(LifecycleEvent::started("app/a"));
    let change = harness.apply(LifecycleEvent::failed(
        "app/a",
        "",
        "3% slower, 1 different file",
    ));

    assert_eq!(change.previous_phase, Some(TestPhase::Running));
    assert_eq!(harness.count("Failed/Performance differences"), 1);
    assert_eq!(harness.count("Failed/Performance differences/Slower"), 1);
    assert_eq!(harness.count("Failed/One different file"), 1);
    assert_eq!(harness.count("Failed"), 0);
    assert_eq!(harness.count("Running"), 0);
    assert_eq!(
        harness.monitor.owner_of(&TestId::new("app/a")).map(|n| n.id()),
        Some("Failed/One different file")
    );
}

#[test]
fn bare_crash() {
    let mut harness = Harness::new(MonitorConfig::default(), &["app/a"]);
    harness.apply(LifecycleEvent::failed("app/a", "crash", ""));

    assert_eq!(harness.count("Failed/Crashed"), 1);
    let populated: Vec<_> = harness
        .counts()
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .collect();
    assert_eq!(populated, vec![("Failed/Crashed".to_owned(), 1)]);
    assert_eq!(
        harness.monitor.owner_of(&TestId::new("app/a")).map(|n| n.id()),
        Some("Failed/Crashed")
    );
}

#[test]
fn killed_counts_in_unrunnable_and_killed() {
    let mut harness = Harness::new(MonitorConfig::default(), &["app/a"]);
    harness.apply(LifecycleEvent::failed("app/a", "killed", ""));

    assert_eq!(harness.count("Failed/Unrunnable"), 1);
    assert_eq!(harness.count("Failed/Unrunnable/Killed"), 1);
}

#[test]
fn toggling_failed_and_then_crashed() {
    let mut harness = Harness::new(
        MonitorConfig::default(),
        &["app/crash", "app/slow", "app/bug", "app/ok"],
    );
    harness.apply(LifecycleEvent::failed("app/crash", "crash", ""));
    harness.apply(LifecycleEvent::failed("app/slow", "", "5% slower"));
    harness.apply(LifecycleEvent::failed("app/bug", "bug", ""));
    harness.apply(LifecycleEvent::succeeded("app/ok"));

    harness.toggle("Failed", false);
    assert!(!harness.test_visible("app/crash"));
    assert!(!harness.test_visible("app/slow"));
    assert!(!harness.test_visible("app/bug"));
    assert!(harness.test_visible("app/ok"));
    assert_eq!(harness.count("Failed/Crashed"), 1, "toggles never change counts");

    harness.toggle("Failed/Crashed", true);
    assert!(harness.test_visible("app/crash"));
    assert!(!harness.test_visible("app/slow"));
    assert!(!harness.test_visible("app/bug"));
    assert_eq!(harness.monitor.is_category_visible("Failed"), Some(false));
}

#[test]
fn empty_suites_are_hidden() {
    let config = MonitorConfig {
        hide_empty_suites: true,
        ..Default::default()
    };
    let mut harness = Harness::new(
        config,
        &["app/parser/a", "app/parser/b", "app/lexer/c", "top"],
    );
    harness.apply(LifecycleEvent::failed("app/parser/a", "crash", ""));
    harness.apply(LifecycleEvent::failed("app/parser/b", "crash", ""));
    harness.apply(LifecycleEvent::succeeded("app/lexer/c"));

    harness.toggle("failed.crashed", false);
    assert_eq!(harness.suites.is_suite_visible("app/parser"), Some(false));
    assert_eq!(harness.suites.is_suite_visible("app"), Some(true));
    assert_eq!(harness.suites.is_suite_visible("app/lexer"), Some(true));

    // Making one child visible again shows the suite without touching its sibling.
    harness.apply(LifecycleEvent::succeeded("app/parser/a"));
    assert!(harness.test_visible("app/parser/a"));
    assert!(!harness.test_visible("app/parser/b"));
    assert_eq!(harness.suites.is_suite_visible("app/parser"), Some(true));
}

#[test]
fn root_stays_visible_when_everything_is_hidden() {
    let config = MonitorConfig {
        hide_empty_suites: true,
        hide_non_started: true,
        ..Default::default()
    };
    let harness = Harness::new(config, &["app/a", "app/b"]);
    assert_eq!(harness.suites.is_suite_visible("app"), Some(false));
    assert_eq!(harness.suites.is_suite_visible(""), Some(true));
    assert!(harness.suites.visible_rows().is_empty());
}

#[test]
fn replaying_the_same_outcome_is_idempotent() {
    let mut harness = Harness::new(MonitorConfig::default(), &["app/a", "app/b"]);
    harness.apply(LifecycleEvent::failed("app/a", "crash", "1% larger"));
    harness.apply(LifecycleEvent::failed("app/b", "", "new output"));
    let before = harness.counts();
    let stats = harness.monitor.stats();

    let change = harness.apply(LifecycleEvent::failed("app/a", "crash", "1% larger"));
    assert!(change.transitions.is_empty());
    assert_eq!(harness.counts(), before);
    assert_eq!(harness.monitor.stats(), stats);
}

#[test]
fn recomputed_result_moves_counts() {
    let mut harness = Harness::new(MonitorConfig::default(), &["app/a"]);
    harness.apply(LifecycleEvent::failed("app/a", "", "3% slower"));
    assert_eq!(harness.count("Failed/Performance differences/Slower"), 1);

    harness.apply(LifecycleEvent::succeeded("app/a"));
    assert_eq!(harness.count("Failed/Performance differences"), 0);
    assert_eq!(harness.count("Failed/Performance differences/Slower"), 0);
    assert_eq!(harness.count("Succeeded"), 1);

    let stats = harness.monitor.stats();
    assert_eq!((stats.succeeded, stats.failed), (1, 0));
}

#[test]
fn toggle_off_then_on_restores_subtree() {
    let mut harness = Harness::new(MonitorConfig::default(), &["app/a", "app/b"]);
    harness.apply(LifecycleEvent::failed("app/a", "killed", ""));
    harness.apply(LifecycleEvent::failed("app/b", "", "2% faster"));
    let before: Vec<_> = harness
        .monitor
        .categories()
        .preorder()
        .into_iter()
        .map(|node| harness.monitor.categories().node(node).is_visible())
        .collect();

    harness.toggle("Failed/Unrunnable", false);
    assert!(!harness.test_visible("app/a"));
    assert!(harness.test_visible("app/b"));
    harness.toggle("Failed/Unrunnable", true);
    assert!(harness.test_visible("app/a"));

    let after: Vec<_> = harness
        .monitor
        .categories()
        .preorder()
        .into_iter()
        .map(|node| harness.monitor.categories().node(node).is_visible())
        .collect();
    assert_eq!(before, after);
}

#[test]
fn custom_categories_from_toml() {
    let config = MonitorConfig::from_toml_str(indoc! {r#"
        custom_errors = ["TIMEOUT{Timed out}"]
        custom_crash_errors = ["SIGSEGV{SegFault}"]
        hide_failed.crashed.segfault = true
    "#});
    // Dotted keys nest in TOML, so this is rejected as a table.
    assert!(config.is_err(), "dotted bare keys are tables");

    let config = MonitorConfig::from_toml_str(indoc! {r#"
        custom_errors = ["TIMEOUT{Timed out}"]
        custom_crash_errors = ["SIGSEGV{SegFault}"]

        [hide]
        "failed.crashed.segfault" = true
    "#})
    .expect("config is valid");
    assert_eq!(
        config.custom_crash_errors,
        vec![CustomCategorySpec::new("SIGSEGV", Some("SegFault"))]
    );

    let mut harness = Harness::new(config, &["app/a", "app/b"]);
    harness.apply(LifecycleEvent::failed("app/a", "crash", "SIGSEGV at 0x0"));
    harness.apply(LifecycleEvent::failed("app/b", "", "TIMEOUT after 30s"));

    assert_eq!(harness.count("Failed/Crashed"), 1);
    assert_eq!(harness.count("Failed/Crashed/SegFault"), 1);
    assert_eq!(harness.count("Failed/Timed out"), 1);
    assert!(!harness.test_visible("app/a"), "SegFault is hidden by default");
    assert!(harness.test_visible("app/b"));
    assert_eq!(
        harness.monitor.tests_in("Failed/Timed out"),
        Some(vec![TestId::new("app/b")])
    );
}

#[test]
fn progress_and_summary() {
    let mut harness = Harness::new(MonitorConfig::default(), &["a", "b", "c"]);
    harness.apply(LifecycleEvent::started("a"));
    harness.apply(LifecycleEvent::failed("a", "bug", ""));
    harness.apply(LifecycleEvent::started("b"));
    assert_eq!(
        harness.monitor.stats().progress_message().to_string(),
        "1 of 3 tests completed (1 test failed)"
    );
    assert_eq!(
        harness
            .monitor
            .summary()
            .populated_only(true)
            .to_string(),
        indoc! {"
            --> Pending : 1
            --> Running : 1
            --> Failed : 0
            ----> Known bug : 1
        "}
    );

    let rows: Vec<_> = harness
        .suites
        .visible_rows()
        .into_iter()
        .map(|row| (row.name.to_string(), row.kind))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("a".to_owned(), SuiteRowKind::Test),
            ("b".to_owned(), SuiteRowKind::Test),
            ("c".to_owned(), SuiteRowKind::Test),
        ]
    );
}
