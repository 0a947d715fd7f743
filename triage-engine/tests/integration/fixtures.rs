// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use triage_engine::{
    config::MonitorConfig,
    events::{LifecycleEvent, TestId},
    monitor::{LifecycleChange, ProgressMonitor},
    suite_tree::SuiteTree,
};

/// A monitor together with the suite tree it updates.
pub(crate) struct Harness {
    pub(crate) monitor: ProgressMonitor,
    pub(crate) suites: SuiteTree,
}

impl Harness {
    pub(crate) fn new(config: MonitorConfig, tests: &[&str]) -> Self {
        let mut harness = Self {
            monitor: ProgressMonitor::new(&config),
            suites: SuiteTree::new(),
        };
        for test in tests {
            let test = TestId::new(test);
            harness.suites.insert_test(&test);
            assert!(harness.monitor.add_test(&test, &mut harness.suites));
        }
        harness
    }

    pub(crate) fn apply(&mut self, event: LifecycleEvent) -> LifecycleChange {
        self.monitor.on_lifecycle_change(&event, &mut self.suites)
    }

    pub(crate) fn toggle(&mut self, node: &str, visible: bool) {
        assert!(
            self.monitor
                .on_category_toggle(node, visible, &mut self.suites),
            "{node} exists"
        );
    }

    pub(crate) fn count(&self, id: &str) -> usize {
        self.monitor
            .count_of(id)
            .unwrap_or_else(|| panic!("{id} exists"))
    }

    pub(crate) fn test_visible(&self, test: &str) -> bool {
        let test = TestId::new(test);
        let shown = self
            .suites
            .is_test_visible(&test)
            .unwrap_or_else(|| panic!("{test} is in the suite tree"));
        assert_eq!(
            self.monitor.is_visible(&test),
            Some(shown),
            "suite tree agrees with the monitor for {test}"
        );
        shown
    }

    /// Counts for every node, in pre-order.
    pub(crate) fn counts(&self) -> Vec<(String, usize)> {
        let tree = self.monitor.categories();
        tree.preorder()
            .into_iter()
            .map(|node| (tree.node(node).id().to_owned(), tree.node(node).count()))
            .collect()
    }
}
