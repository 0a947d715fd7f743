// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The progress monitor: the single owner of the category tree, the classification index, the
//! progress counters and the visibility state.
//!
//! All mutation goes through [`ProgressMonitor::on_lifecycle_change`] (test state changes) and
//! [`ProgressMonitor::on_category_toggle`] (user decisions). Both take the caller's
//! [`DisplayHierarchy`] so that visibility is pushed to it before they return.

use crate::{
    aggregator::ProgressStats,
    category::{BuiltinCategory, CategoryNode, CategoryTree, NodeIndex},
    classifier::OutcomeClassifier,
    config::{ConfigWarnings, LogConfigWarnings, MonitorConfig},
    errors::{ConfigWarning, UnknownCategory, UnknownHidePath},
    events::{LifecycleEvent, TestId, TestPhase},
    index::{ClassificationEntry, ClassificationIndex, CountTransition},
    summary::CategorySummary,
    visibility::{DisplayHierarchy, VisibilityPropagator},
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// What a lifecycle event changed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LifecycleChange {
    /// The phase the test was in before the event, or `None` if the event registered the test.
    pub previous_phase: Option<TestPhase>,
    /// The phase the test is in now.
    pub phase: TestPhase,
    /// The node that now owns the test.
    pub owner: NodeIndex,
    /// Whether the test is now visible.
    pub visible: bool,
    /// Nodes whose count crossed zero.
    pub transitions: Vec<CountTransition>,
}

/// Tracks the classification and visibility of a population of tests.
#[derive(Clone, Debug)]
pub struct ProgressMonitor {
    tree: CategoryTree,
    classifier: OutcomeClassifier,
    index: ClassificationIndex,
    stats: ProgressStats,
    propagator: VisibilityPropagator,
}

impl ProgressMonitor {
    /// Creates a monitor from configuration, logging any configuration problems.
    pub fn new(config: &MonitorConfig) -> Self {
        Self::with_warnings(config, &mut LogConfigWarnings)
    }

    /// Creates a monitor from configuration, reporting problems to `warnings`.
    pub fn with_warnings(config: &MonitorConfig, warnings: &mut impl ConfigWarnings) -> Self {
        let mut tree = CategoryTree::build(
            &config.custom_errors,
            &config.custom_crash_errors,
            &config.custom_unrunnable_errors,
            warnings,
        );

        let mut hide_flags = Vec::new();
        if config.hide_non_started {
            hide_flags.push((BuiltinCategory::Pending.index(), true));
        }
        for label in &config.hide_categories {
            let node = OutcomeClassifier::category_node(label)
                .map(BuiltinCategory::index)
                .or_else(|| tree.find_by_label(label));
            match node {
                Some(node) => hide_flags.push((node, true)),
                None => warnings.warn(ConfigWarning::UnknownHidePath(UnknownHidePath::new(
                    label.as_str(),
                ))),
            }
        }
        for hide_path in &config.hide_paths {
            match tree.find_dotted(&hide_path.path) {
                Some(node) => hide_flags.push((node, hide_path.hide)),
                None => warnings.warn(ConfigWarning::UnknownHidePath(UnknownHidePath::new(
                    hide_path.path.as_str(),
                ))),
            }
        }
        tree.apply_config_defaults(&hide_flags);

        let classifier = OutcomeClassifier::new(&tree);
        debug!(
            nodes = tree.len(),
            custom = tree.custom_categories().len(),
            hide_empty_suites = config.hide_empty_suites,
            "progress monitor: built category tree"
        );

        Self {
            tree,
            classifier,
            index: ClassificationIndex::new(),
            stats: ProgressStats::default(),
            propagator: VisibilityPropagator::new(config.hide_empty_suites),
        }
    }

    /// Starts tracking a test, in the not-started phase.
    ///
    /// The test must already be in `hierarchy`. Returns false if the test was already tracked.
    pub fn add_test<H: DisplayHierarchy>(&mut self, test: &TestId, hierarchy: &mut H) -> bool {
        if self.index.contains(test) {
            debug!(%test, "progress monitor: test already tracked");
            return false;
        }

        let phase = TestPhase::NotStarted;
        let classification = self.classifier.classify(phase, "", "");
        let owner = classification.owner();
        self.index.reclassify(
            &mut self.tree,
            test,
            ClassificationEntry::new("", "", phase, classification),
        );
        self.stats.on_test_added(phase);

        let visible = self.tree.node(owner).is_visible();
        self.propagator.update_test(test, visible, hierarchy);
        trace!("progress monitor: added {test}\n{}", self.summary());
        true
    }

    /// Stops tracking a test.
    ///
    /// Its memberships and progress counter are dropped, and its row is hidden in `hierarchy` so
    /// that suites left without visible tests are reconciled. The caller then removes the row from
    /// its own hierarchy. Returns false if the test was not tracked.
    pub fn remove_test<H: DisplayHierarchy>(
        &mut self,
        test: &TestId,
        hierarchy: &mut H,
    ) -> bool {
        let Some((entry, _)) = self.index.remove(&mut self.tree, test) else {
            return false;
        };
        self.stats.on_test_removed(entry.phase());
        self.propagator.remove_test(test, hierarchy);
        debug!(%test, "progress monitor: removed test");
        true
    }

    /// Applies a lifecycle event: updates the progress counters, reclassifies the test, and pushes
    /// its visibility to `hierarchy`.
    ///
    /// A test that was never added is registered by its first event, and counted in the phase the
    /// event puts it in.
    pub fn on_lifecycle_change<H: DisplayHierarchy>(
        &mut self,
        event: &LifecycleEvent,
        hierarchy: &mut H,
    ) -> LifecycleChange {
        let test = &event.test_id;
        let previous_phase = self.index.get(test).map(ClassificationEntry::phase);
        let phase = event.phase();
        match previous_phase {
            Some(previous_phase) => self.stats.on_transition(previous_phase, phase),
            None => {
                debug!(%test, "progress monitor: registering test from its first event");
                self.stats.on_test_added(phase);
            }
        }

        let classification = self
            .classifier
            .classify(phase, &event.category, &event.detail);
        let owner = classification.owner();
        let reclassified = self.index.reclassify(
            &mut self.tree,
            test,
            ClassificationEntry::new(
                event.category.as_str(),
                event.detail.as_str(),
                phase,
                classification,
            ),
        );

        let visible = self.tree.node(owner).is_visible();
        self.propagator.update_test(test, visible, hierarchy);

        debug!(
            %test,
            from = ?previous_phase,
            to = %phase,
            owner = self.tree.node(owner).id(),
            visible,
            "progress monitor: lifecycle change"
        );
        trace!("progress monitor: category counts\n{}", self.summary());

        LifecycleChange {
            previous_phase,
            phase,
            owner,
            visible,
            transitions: reclassified.transitions,
        }
    }

    /// Shows or hides a category, its descendants, and every test they own.
    ///
    /// `node` is a node id (`Failed/Crashed`) or a dotted path (`failed.crashed`). Returns false,
    /// changing nothing, if no such node exists.
    pub fn on_category_toggle<H: DisplayHierarchy>(
        &mut self,
        node: &str,
        visible: bool,
        hierarchy: &mut H,
    ) -> bool {
        let Ok(index) = self.tree.find(node) else {
            debug!(node, "progress monitor: toggle for unknown category, ignoring");
            return false;
        };

        let updated = self.tree.set_visible(index, visible);
        let tests = self.index.owned_within(&self.tree, index);
        self.propagator.apply_batch(&tests, visible, hierarchy);

        debug!(
            node = self.tree.node(index).id(),
            visible,
            categories = updated.len(),
            tests = tests.len(),
            "progress monitor: category toggled"
        );
        true
    }

    /// Returns the number of tests attributed to a node, by id.
    pub fn count_of(&self, id: &str) -> Option<usize> {
        self.tree.count_of(id)
    }

    /// Returns whether a node is visible, by id.
    pub fn is_category_visible(&self, id: &str) -> Option<bool> {
        self.tree.is_visible(id)
    }

    /// Returns whether a test is visible: exactly when its owner node is.
    pub fn is_visible(&self, test: &TestId) -> Option<bool> {
        self.index
            .get(test)
            .map(|entry| self.tree.node(entry.owner()).is_visible())
    }

    /// Returns the node that owns a test.
    pub fn owner_of(&self, test: &TestId) -> Option<&CategoryNode> {
        self.index
            .get(test)
            .map(|entry| self.tree.node(entry.owner()))
    }

    /// Returns the stored classification of a test.
    pub fn entry(&self, test: &TestId) -> Option<&ClassificationEntry> {
        self.index.get(test)
    }

    /// Returns the tests attributed to a node, by id, in the order they were attributed.
    pub fn tests_in(&self, id: &str) -> Option<Vec<TestId>> {
        let index = self.tree.get(id)?;
        Some(self.tree.node(index).members().cloned().collect())
    }

    /// Resolves a node id or dotted path.
    pub fn find_category(&self, name: &str) -> Result<NodeIndex, UnknownCategory> {
        self.tree.find(name)
    }

    /// Returns the progress counters.
    pub fn stats(&self) -> ProgressStats {
        self.stats
    }

    /// Returns the category tree.
    pub fn categories(&self) -> &CategoryTree {
        &self.tree
    }

    /// Returns the tracked tests and their classification, in the order they were added.
    pub fn tests(&self) -> impl Iterator<Item = (&TestId, &ClassificationEntry)> + '_ {
        self.index.iter()
    }

    /// Returns a plain-text summary of the category tree.
    pub fn summary(&self) -> CategorySummary<'_> {
        CategorySummary::new(&self.tree)
    }
}

/// A [`ProgressMonitor`] and its display hierarchy behind a single mutex.
///
/// Events may be submitted from any thread; each is applied as a unit, so decrements and
/// increments of different events never interleave.
pub struct SharedProgressMonitor<H> {
    inner: Arc<Mutex<SharedState<H>>>,
}

struct SharedState<H> {
    monitor: ProgressMonitor,
    hierarchy: H,
}

impl<H> Clone for SharedProgressMonitor<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H: DisplayHierarchy> SharedProgressMonitor<H> {
    /// Wraps a monitor and the hierarchy it updates.
    pub fn new(monitor: ProgressMonitor, hierarchy: H) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SharedState { monitor, hierarchy })),
        }
    }

    /// See [`ProgressMonitor::add_test`].
    pub fn add_test(&self, test: &TestId) -> bool {
        let mut state = self.lock();
        let SharedState { monitor, hierarchy } = &mut *state;
        monitor.add_test(test, hierarchy)
    }

    /// See [`ProgressMonitor::on_lifecycle_change`].
    pub fn on_lifecycle_change(&self, event: &LifecycleEvent) -> LifecycleChange {
        let mut state = self.lock();
        let SharedState { monitor, hierarchy } = &mut *state;
        monitor.on_lifecycle_change(event, hierarchy)
    }

    /// See [`ProgressMonitor::on_category_toggle`].
    pub fn on_category_toggle(&self, node: &str, visible: bool) -> bool {
        let mut state = self.lock();
        let SharedState { monitor, hierarchy } = &mut *state;
        monitor.on_category_toggle(node, visible, hierarchy)
    }

    /// Runs `f` with the monitor and hierarchy locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut ProgressMonitor, &mut H) -> R) -> R {
        let mut state = self.lock();
        let SharedState { monitor, hierarchy } = &mut *state;
        f(monitor, hierarchy)
    }

    fn lock(&self) -> MutexGuard<'_, SharedState<H>> {
        // Every operation leaves the state consistent before it can panic.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
