// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Visibility of tests and of their suites in a caller-owned display hierarchy.
//!
//! A test is visible exactly when the category node that owns it is visible. Suites are only
//! touched when `hide_empty_suites` is enabled: a suite is then hidden once none of its immediate
//! children are visible, and shown again as soon as a test under it becomes visible. The root of
//! the hierarchy is never hidden.

use crate::events::TestId;
use std::{collections::HashMap, fmt, hash::Hash};
use tracing::trace;

/// The caller's display hierarchy: tests grouped into nested suites.
///
/// The engine never inspects the hierarchy beyond these operations, and never adds or removes
/// rows. The root group is the group with no parent.
pub trait DisplayHierarchy {
    /// A handle to a group (suite) in the hierarchy.
    type Group: Clone + Eq + Hash + fmt::Debug;

    /// Returns the group containing `test`, or `None` if the test is not in the hierarchy.
    fn test_parent(&self, test: &TestId) -> Option<Self::Group>;

    /// Returns the parent of `group`, or `None` if `group` is the root.
    fn group_parent(&self, group: &Self::Group) -> Option<Self::Group>;

    /// Returns true if any immediate child of `group`, test or group, is visible.
    fn has_visible_child(&self, group: &Self::Group) -> bool;

    /// Shows or hides a test row.
    fn set_test_visible(&mut self, test: &TestId, visible: bool);

    /// Shows or hides a group row.
    fn set_group_visible(&mut self, group: &Self::Group, visible: bool);
}

/// A display hierarchy with no rows, for callers that only need counts.
#[derive(Clone, Copy, Debug, Default)]
pub struct Detached;

impl DisplayHierarchy for Detached {
    type Group = ();

    fn test_parent(&self, _test: &TestId) -> Option<()> {
        None
    }

    fn group_parent(&self, _group: &()) -> Option<()> {
        None
    }

    fn has_visible_child(&self, _group: &()) -> bool {
        false
    }

    fn set_test_visible(&mut self, _test: &TestId, _visible: bool) {}

    fn set_group_visible(&mut self, _group: &(), _visible: bool) {}
}

/// Tracks the visibility pushed to the display hierarchy for each test.
#[derive(Clone, Debug, Default)]
pub struct VisibilityPropagator {
    hide_empty_suites: bool,
    visible: HashMap<TestId, bool>,
}

impl VisibilityPropagator {
    /// Creates a new propagator.
    pub fn new(hide_empty_suites: bool) -> Self {
        Self {
            hide_empty_suites,
            visible: HashMap::new(),
        }
    }

    /// Returns true if suites with no visible children are hidden.
    pub fn hide_empty_suites(&self) -> bool {
        self.hide_empty_suites
    }

    /// Returns the visibility last pushed for `test`.
    pub fn is_visible(&self, test: &TestId) -> Option<bool> {
        self.visible.get(test).copied()
    }

    /// Sets the visibility of a single test and reconciles its ancestors.
    ///
    /// The hierarchy is only updated if the visibility changed, or if this is the first time the
    /// test is seen. Returns true if the hierarchy was updated.
    pub fn update_test<H: DisplayHierarchy>(
        &mut self,
        test: &TestId,
        visible: bool,
        hierarchy: &mut H,
    ) -> bool {
        if !self.set_state(test, visible, hierarchy) {
            return false;
        }
        self.reconcile_ancestors(test, visible, hierarchy);
        true
    }

    /// Sets the visibility of a batch of tests, as done for a category toggle.
    ///
    /// Every test is updated before any ancestor is reconciled, so that checks for visible
    /// children see the final state.
    pub fn apply_batch<H: DisplayHierarchy>(
        &mut self,
        tests: &[TestId],
        visible: bool,
        hierarchy: &mut H,
    ) {
        for test in tests {
            self.set_state(test, visible, hierarchy);
        }
        for test in tests {
            self.reconcile_ancestors(test, visible, hierarchy);
        }
    }

    /// Recomputes the visibility of the groups above `test`. A no-op unless
    /// `hide_empty_suites` is enabled.
    ///
    /// If the test is hidden, groups are hidden from the test's parent upwards until a group
    /// that still has a visible child is found. If the test is visible, every group above it is
    /// shown. The root is never touched.
    pub fn reconcile_ancestors<H: DisplayHierarchy>(
        &self,
        test: &TestId,
        visible: bool,
        hierarchy: &mut H,
    ) {
        if !self.hide_empty_suites {
            return;
        }

        let mut current = hierarchy.test_parent(test);
        while let Some(group) = current {
            let Some(parent) = hierarchy.group_parent(&group) else {
                // Root.
                break;
            };
            if !visible && hierarchy.has_visible_child(&group) {
                break;
            }
            trace!(?group, visible, "reconciling suite visibility");
            hierarchy.set_group_visible(&group, visible);
            current = Some(parent);
        }
    }

    /// Forgets a test that was removed.
    pub fn forget(&mut self, test: &TestId) -> Option<bool> {
        self.visible.remove(test)
    }

    /// Forgets a test that is about to leave the hierarchy, hiding its row first so that its
    /// ancestors are reconciled without it.
    ///
    /// The caller unlinks the row afterwards.
    pub fn remove_test<H: DisplayHierarchy>(&mut self, test: &TestId, hierarchy: &mut H) {
        if self.forget(test) == Some(true) {
            hierarchy.set_test_visible(test, false);
            self.reconcile_ancestors(test, false, hierarchy);
        }
    }

    fn set_state<H: DisplayHierarchy>(
        &mut self,
        test: &TestId,
        visible: bool,
        hierarchy: &mut H,
    ) -> bool {
        if self.visible.insert(test.clone(), visible) == Some(visible) {
            return false;
        }
        hierarchy.set_test_visible(test, visible);
        true
    }
}
