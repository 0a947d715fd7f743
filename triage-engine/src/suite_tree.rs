// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! An in-memory [`DisplayHierarchy`] built from test ids.
//!
//! Test ids are split on `/`: every component but the last names a suite, and the last names the
//! test. `app/parser/empty_input` is the test `empty_input` in suite `parser`, itself in suite
//! `app`. Ids without a `/` belong directly to the root.

use crate::{events::TestId, visibility::DisplayHierarchy};
use indexmap::IndexMap;
use smol_str::SmolStr;
use std::collections::HashMap;

/// A handle to a suite in a [`SuiteTree`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SuiteIndex(usize);

impl SuiteIndex {
    /// The root suite, which has no name and is never hidden.
    pub const ROOT: SuiteIndex = SuiteIndex(0);
}

#[derive(Clone, Debug)]
struct Suite {
    name: SmolStr,
    parent: Option<SuiteIndex>,
    visible: bool,
    suites: Vec<SuiteIndex>,
    tests: Vec<TestId>,
}

impl Suite {
    fn new(name: SmolStr, parent: Option<SuiteIndex>) -> Self {
        Self {
            name,
            parent,
            visible: true,
            suites: Vec::new(),
            tests: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
struct TestRow {
    suite: SuiteIndex,
    name: SmolStr,
    visible: bool,
}

/// The kind of a [`SuiteRow`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SuiteRowKind {
    /// A suite.
    Suite,
    /// A test.
    Test,
}

/// A visible row of a [`SuiteTree`], as returned by [`SuiteTree::visible_rows`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SuiteRow {
    /// The nesting depth. Children of the root have depth 0.
    pub depth: usize,
    /// The name of the suite or test.
    pub name: SmolStr,
    /// Whether this row is a suite or a test.
    pub kind: SuiteRowKind,
}

/// A tree of suites and tests, keyed by test id.
#[derive(Clone, Debug)]
pub struct SuiteTree {
    // Suites that become empty are unlinked from their parent but keep their slot.
    suites: Vec<Suite>,
    by_path: HashMap<SmolStr, SuiteIndex>,
    tests: IndexMap<TestId, TestRow>,
}

impl Default for SuiteTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SuiteTree {
    /// Creates a tree containing only the root suite.
    pub fn new() -> Self {
        Self {
            suites: vec![Suite::new(SmolStr::default(), None)],
            by_path: HashMap::new(),
            tests: IndexMap::new(),
        }
    }

    /// Adds a test, creating its suites as needed. Returns false if the test was already present.
    pub fn insert_test(&mut self, test: &TestId) -> bool {
        if self.tests.contains_key(test) {
            return false;
        }

        let (suite_path, name) = match test.as_str().rsplit_once('/') {
            Some((suite_path, name)) => (Some(suite_path), name),
            None => (None, test.as_str()),
        };

        let mut suite = SuiteIndex::ROOT;
        if let Some(suite_path) = suite_path {
            let mut prefix_end = 0;
            for component in suite_path.split('/') {
                prefix_end += component.len();
                let prefix = &suite_path[..prefix_end];
                prefix_end += 1;
                suite = match self.by_path.get(prefix) {
                    Some(&existing) => existing,
                    None => self.push_suite(suite, prefix, component),
                };
            }
        }

        self.suites[suite.0].tests.push(test.clone());
        self.tests.insert(
            test.clone(),
            TestRow {
                suite,
                name: SmolStr::new(name),
                visible: true,
            },
        );
        true
    }

    fn push_suite(&mut self, parent: SuiteIndex, path: &str, name: &str) -> SuiteIndex {
        let index = SuiteIndex(self.suites.len());
        self.suites.push(Suite::new(SmolStr::new(name), Some(parent)));
        self.suites[parent.0].suites.push(index);
        self.by_path.insert(SmolStr::new(path), index);
        index
    }

    /// Removes a test. Suites left without children are removed too.
    ///
    /// Returns false if the test was not present.
    pub fn remove_test(&mut self, test: &TestId) -> bool {
        let Some(row) = self.tests.shift_remove(test) else {
            return false;
        };
        self.suites[row.suite.0].tests.retain(|t| t != test);

        let mut current = row.suite;
        while let Some(parent) = self.suites[current.0].parent {
            let suite = &self.suites[current.0];
            if !suite.tests.is_empty() || !suite.suites.is_empty() {
                break;
            }
            self.suites[parent.0].suites.retain(|&s| s != current);
            self.by_path.retain(|_, &mut index| index != current);
            current = parent;
        }
        true
    }

    /// Returns the number of tests in the tree.
    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    /// Returns the suite with the given `/`-separated path, e.g. `app/parser`.
    pub fn suite(&self, path: &str) -> Option<SuiteIndex> {
        if path.is_empty() {
            Some(SuiteIndex::ROOT)
        } else {
            self.by_path.get(path).copied()
        }
    }

    /// Returns whether a test row is visible.
    pub fn is_test_visible(&self, test: &TestId) -> Option<bool> {
        self.tests.get(test).map(|row| row.visible)
    }

    /// Returns whether the suite with the given path is visible.
    pub fn is_suite_visible(&self, path: &str) -> Option<bool> {
        self.suite(path).map(|index| self.suites[index.0].visible)
    }

    /// Returns the visible rows in display order: each suite's tests, then its child suites.
    ///
    /// Children of hidden suites are not returned, even if they are visible themselves.
    pub fn visible_rows(&self) -> Vec<SuiteRow> {
        let mut rows = Vec::new();
        // (suite, depth of its children)
        let mut stack = vec![(SuiteIndex::ROOT, 0)];
        while let Some((index, depth)) = stack.pop() {
            let suite = &self.suites[index.0];
            if index != SuiteIndex::ROOT {
                if !suite.visible {
                    continue;
                }
                rows.push(SuiteRow {
                    depth: depth - 1,
                    name: suite.name.clone(),
                    kind: SuiteRowKind::Suite,
                });
            }
            for test in &suite.tests {
                let row = &self.tests[test];
                if row.visible {
                    rows.push(SuiteRow {
                        depth,
                        name: row.name.clone(),
                        kind: SuiteRowKind::Test,
                    });
                }
            }
            stack.extend(suite.suites.iter().rev().map(|&child| (child, depth + 1)));
        }
        rows
    }
}

impl DisplayHierarchy for SuiteTree {
    type Group = SuiteIndex;

    fn test_parent(&self, test: &TestId) -> Option<SuiteIndex> {
        self.tests.get(test).map(|row| row.suite)
    }

    fn group_parent(&self, group: &SuiteIndex) -> Option<SuiteIndex> {
        self.suites[group.0].parent
    }

    fn has_visible_child(&self, group: &SuiteIndex) -> bool {
        let suite = &self.suites[group.0];
        suite.tests.iter().any(|test| self.tests[test].visible)
            || suite.suites.iter().any(|child| self.suites[child.0].visible)
    }

    fn set_test_visible(&mut self, test: &TestId, visible: bool) {
        if let Some(row) = self.tests.get_mut(test) {
            row.visible = visible;
        }
    }

    fn set_group_visible(&mut self, group: &SuiteIndex, visible: bool) {
        self.suites[group.0].visible = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::VisibilityPropagator;
    use pretty_assertions::assert_eq;

    fn tree(ids: &[&str]) -> SuiteTree {
        let mut tree = SuiteTree::new();
        for id in ids {
            assert!(tree.insert_test(&TestId::new(id)), "{id} is new");
        }
        tree
    }

    fn render(tree: &SuiteTree) -> Vec<String> {
        tree.visible_rows()
            .into_iter()
            .map(|row| {
                let marker = match row.kind {
                    SuiteRowKind::Suite => "+",
                    SuiteRowKind::Test => "-",
                };
                format!("{}{marker} {}", "  ".repeat(row.depth), row.name)
            })
            .collect()
    }

    #[test]
    fn builds_suites_from_ids() {
        let mut tree = tree(&["app/parser/empty", "app/parser/nested", "app/cli", "top"]);
        assert!(!tree.insert_test(&TestId::new("app/cli")), "duplicate insert");
        assert_eq!(
            render(&tree),
            vec!["- top", "+ app", "  - cli", "  + parser", "    - empty", "    - nested"]
        );
        assert_eq!(
            tree.test_parent(&TestId::new("app/parser/empty")),
            tree.suite("app/parser")
        );
        assert_eq!(
            tree.test_parent(&TestId::new("top")),
            Some(SuiteIndex::ROOT)
        );
    }

    #[test]
    fn hidden_suite_hides_its_rows() {
        let mut tree = tree(&["app/parser/empty", "app/cli"]);
        let parser = tree.suite("app/parser").expect("suite exists");
        tree.set_group_visible(&parser, false);
        assert_eq!(render(&tree), vec!["+ app", "  - cli"]);
    }

    #[test]
    fn remove_prunes_empty_suites() {
        let mut tree = tree(&["app/parser/empty", "app/cli"]);
        assert!(tree.remove_test(&TestId::new("app/parser/empty")));
        assert!(!tree.remove_test(&TestId::new("app/parser/empty")));
        assert_eq!(tree.suite("app/parser"), None);
        assert_eq!(render(&tree), vec!["+ app", "  - cli"]);

        let app = tree.suite("app").expect("suite exists");
        assert!(tree.has_visible_child(&app));
    }

    #[test]
    fn empty_suites_follow_their_tests() {
        let mut tree = tree(&["app/parser/empty", "app/parser/nested", "app/cli"]);
        let mut propagator = VisibilityPropagator::new(true);
        let empty = TestId::new("app/parser/empty");
        let nested = TestId::new("app/parser/nested");

        propagator.apply_batch(&[empty.clone(), nested.clone()], false, &mut tree);
        assert_eq!(tree.is_suite_visible("app/parser"), Some(false));
        assert_eq!(tree.is_suite_visible("app"), Some(true), "cli is still visible");

        propagator.update_test(&nested, true, &mut tree);
        assert_eq!(tree.is_suite_visible("app/parser"), Some(true));
        assert_eq!(tree.is_test_visible(&empty), Some(false), "siblings are untouched");
        assert_eq!(tree.is_suite_visible(""), Some(true), "root is never hidden");
    }
}
