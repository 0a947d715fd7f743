// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-test classification index.
//!
//! The index is the only record of which nodes a test was attributed to. Counts in the
//! [`CategoryTree`] are always decremented from the stored path, never from a recomputed one.

use crate::{
    category::{CategoryTree, NodeIndex},
    classifier::{Classification, ClassificationPath},
    events::{TestId, TestPhase},
};
use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;

/// The stored classification of a single test.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClassificationEntry {
    category: String,
    detail: String,
    phase: TestPhase,
    path: ClassificationPath,
    owner: NodeIndex,
}

impl ClassificationEntry {
    /// Creates an entry from an outcome and its classification.
    pub fn new(
        category: impl Into<String>,
        detail: impl Into<String>,
        phase: TestPhase,
        classification: Classification,
    ) -> Self {
        let owner = classification.owner();
        Self {
            category: category.into(),
            detail: detail.into(),
            phase,
            path: classification.into_path(),
            owner,
        }
    }

    /// The outcome category of the last event.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// The outcome detail of the last event.
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// The phase of the test.
    pub fn phase(&self) -> TestPhase {
        self.phase
    }

    /// The nodes the test is attributed to.
    pub fn path(&self) -> &[NodeIndex] {
        &self.path
    }

    /// The node whose visibility decides the test's.
    pub fn owner(&self) -> NodeIndex {
        self.owner
    }
}

/// A node whose count went from zero to non-zero, or back.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CountTransition {
    /// The node.
    pub node: NodeIndex,
    /// True if the node now has tests, false if it is now empty.
    pub populated: bool,
}

/// The result of replacing a test's entry.
#[derive(Clone, Debug)]
pub struct Reclassified {
    /// The entry that was replaced, if any.
    pub previous: Option<ClassificationEntry>,
    /// Nodes whose count crossed zero, in path order (old path first).
    pub transitions: Vec<CountTransition>,
}

/// Maps tests to their stored classification.
#[derive(Clone, Debug, Default)]
pub struct ClassificationIndex {
    entries: IndexMap<TestId, ClassificationEntry>,
}

impl ClassificationIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for a test.
    pub fn get(&self, test: &TestId) -> Option<&ClassificationEntry> {
        self.entries.get(test)
    }

    /// Returns true if the index has an entry for this test.
    pub fn contains(&self, test: &TestId) -> bool {
        self.entries.contains_key(test)
    }

    /// Returns the number of tests in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index has no tests.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over tests and their entries, in the order tests were first added.
    pub fn iter(&self) -> impl Iterator<Item = (&TestId, &ClassificationEntry)> + '_ {
        self.entries.iter()
    }

    /// Replaces the entry for `test`, moving its memberships in `tree` from the old path to the
    /// new one.
    ///
    /// All old memberships are removed before any new one is added, so replaying the same entry
    /// leaves every count unchanged.
    pub fn reclassify(
        &mut self,
        tree: &mut CategoryTree,
        test: &TestId,
        entry: ClassificationEntry,
    ) -> Reclassified {
        let previous = self.entries.get(test);
        let touched = touched_nodes(previous.map(|e| e.path()), Some(entry.path()));
        let before = snapshot(tree, &touched);

        if let Some(previous) = previous {
            for &node in previous.path() {
                let removed = tree.remove_member(node, test);
                debug_assert!(removed, "`{test}` missing from stored node {node}");
            }
        }
        for &node in entry.path() {
            tree.insert_member(node, test);
        }

        let transitions = transitions(tree, &touched, &before);
        let previous = self.entries.insert(test.clone(), entry);
        Reclassified {
            previous,
            transitions,
        }
    }

    /// Removes a test, dropping its memberships in `tree`.
    pub fn remove(
        &mut self,
        tree: &mut CategoryTree,
        test: &TestId,
    ) -> Option<(ClassificationEntry, Vec<CountTransition>)> {
        let entry = self.entries.shift_remove(test)?;
        let touched = touched_nodes(Some(entry.path()), None);
        let before = snapshot(tree, &touched);
        for &node in entry.path() {
            tree.remove_member(node, test);
        }
        let transitions = transitions(tree, &touched, &before);
        Some((entry, transitions))
    }

    /// Returns the tests whose owner node is `node` or one of its descendants.
    ///
    /// Only the members of the subtree are visited. A test owned within the subtree is a member
    /// of its owner, so no other test needs to be considered.
    pub fn owned_within(&self, tree: &CategoryTree, node: NodeIndex) -> Vec<TestId> {
        let mut owned: IndexSet<&TestId> = IndexSet::new();
        for descendant in tree.descendants(node) {
            for test in tree.node(descendant).members() {
                let owner_within = self
                    .entries
                    .get(test)
                    .is_some_and(|entry| tree.is_within(entry.owner, node));
                if owner_within {
                    owned.insert(test);
                }
            }
        }
        owned.into_iter().cloned().collect()
    }
}

fn touched_nodes(
    old: Option<&[NodeIndex]>,
    new: Option<&[NodeIndex]>,
) -> SmallVec<[NodeIndex; 8]> {
    let mut touched: SmallVec<[NodeIndex; 8]> = SmallVec::new();
    for &node in old.into_iter().chain(new).flatten() {
        if !touched.contains(&node) {
            touched.push(node);
        }
    }
    touched
}

fn snapshot(tree: &CategoryTree, nodes: &[NodeIndex]) -> SmallVec<[bool; 8]> {
    nodes
        .iter()
        .map(|&node| tree.node(node).count() > 0)
        .collect()
}

fn transitions(tree: &CategoryTree, nodes: &[NodeIndex], before: &[bool]) -> Vec<CountTransition> {
    nodes
        .iter()
        .zip(before)
        .filter_map(|(&node, &was_populated)| {
            let populated = tree.node(node).count() > 0;
            (populated != was_populated).then_some(CountTransition { node, populated })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{category::BuiltinCategory, classifier::OutcomeClassifier, config::NoWarnings};
    use pretty_assertions::assert_eq;

    struct Fixture {
        tree: CategoryTree,
        classifier: OutcomeClassifier,
        index: ClassificationIndex,
    }

    impl Fixture {
        fn new() -> Self {
            let tree = CategoryTree::build(&[], &[], &[], &mut NoWarnings);
            let classifier = OutcomeClassifier::new(&tree);
            Self {
                tree,
                classifier,
                index: ClassificationIndex::new(),
            }
        }

        fn apply(
            &mut self,
            test: &str,
            phase: TestPhase,
            category: &str,
            detail: &str,
        ) -> Reclassified {
            let classification = self.classifier.classify(phase, category, detail);
            let entry = ClassificationEntry::new(category, detail, phase, classification);
            self.index
                .reclassify(&mut self.tree, &TestId::new(test), entry)
        }

        fn count(&self, node: BuiltinCategory) -> usize {
            self.tree.node(node.index()).count()
        }
    }

    #[test]
    fn reclassify_moves_memberships() {
        let mut fixture = Fixture::new();
        let reclassified = fixture.apply("a", TestPhase::NotStarted, "", "");
        assert_eq!(reclassified.previous, None);
        assert_eq!(
            reclassified.transitions,
            vec![CountTransition {
                node: BuiltinCategory::Pending.index(),
                populated: true
            }]
        );

        fixture.apply("a", TestPhase::Running, "", "");
        assert_eq!(fixture.count(BuiltinCategory::Pending), 0);
        assert_eq!(fixture.count(BuiltinCategory::Running), 1);

        let reclassified =
            fixture.apply("a", TestPhase::Failed, "", "3% slower, 1 different file");
        assert_eq!(
            reclassified.previous.map(|e| e.phase()),
            Some(TestPhase::Running)
        );
        assert_eq!(fixture.count(BuiltinCategory::Running), 0);
        assert_eq!(fixture.count(BuiltinCategory::PerformanceDifferences), 1);
        assert_eq!(fixture.count(BuiltinCategory::Slower), 1);
        assert_eq!(fixture.count(BuiltinCategory::OneDifferentFile), 1);
        assert_eq!(fixture.count(BuiltinCategory::Failed), 0, "Failed does not sum children");
        assert_eq!(reclassified.transitions.len(), 4, "{:?}", reclassified.transitions);
    }

    #[test]
    fn recomputed_result_replaces_old_path() {
        let mut fixture = Fixture::new();
        fixture.apply("a", TestPhase::Failed, "crash", "");
        fixture.apply("b", TestPhase::Failed, "crash", "");
        assert_eq!(fixture.count(BuiltinCategory::Crashed), 2);

        // Same outcome again: nothing changes.
        let reclassified = fixture.apply("a", TestPhase::Failed, "crash", "");
        assert!(reclassified.transitions.is_empty());
        assert_eq!(fixture.count(BuiltinCategory::Crashed), 2);

        fixture.apply("a", TestPhase::Failed, "bug", "");
        assert_eq!(fixture.count(BuiltinCategory::Crashed), 1);
        assert_eq!(fixture.count(BuiltinCategory::KnownBug), 1);
        assert_eq!(
            fixture.index.get(&TestId::new("a")).map(|e| e.owner()),
            Some(BuiltinCategory::KnownBug.index())
        );
    }

    #[test]
    fn remove_drops_memberships() {
        let mut fixture = Fixture::new();
        fixture.apply("a", TestPhase::Failed, "killed", "");
        let (entry, transitions) = fixture
            .index
            .remove(&mut fixture.tree, &TestId::new("a"))
            .expect("test was present");
        assert_eq!(entry.category(), "killed");
        assert_eq!(transitions.len(), 2);
        assert!(transitions.iter().all(|t| !t.populated));
        assert_eq!(fixture.count(BuiltinCategory::Killed), 0);
        assert_eq!(fixture.count(BuiltinCategory::Unrunnable), 0);

        assert!(
            fixture
                .index
                .remove(&mut fixture.tree, &TestId::new("a"))
                .is_none(),
            "second removal is a no-op"
        );
    }

    #[test]
    fn owned_within_uses_owner_only() {
        let mut fixture = Fixture::new();
        fixture.apply("slow", TestPhase::Failed, "", "3% slower");
        fixture.apply("slow-crash", TestPhase::Failed, "crash", "3% slower");
        fixture.apply("ok", TestPhase::Succeeded, "", "");

        let perf = fixture
            .index
            .owned_within(&fixture.tree, BuiltinCategory::PerformanceDifferences.index());
        assert_eq!(perf, vec![TestId::new("slow")]);

        let failed = fixture
            .index
            .owned_within(&fixture.tree, BuiltinCategory::Failed.index());
        assert_eq!(failed, vec![TestId::new("slow"), TestId::new("slow-crash")]);

        fixture.apply("killed", TestPhase::Failed, "killed", "");
        let unrunnable = fixture
            .index
            .owned_within(&fixture.tree, BuiltinCategory::Unrunnable.index());
        assert_eq!(unrunnable, vec![TestId::new("killed")], "listed once");
        let succeeded = fixture
            .index
            .owned_within(&fixture.tree, BuiltinCategory::Succeeded.index());
        assert_eq!(succeeded, vec![TestId::new("ok")]);
    }
}
