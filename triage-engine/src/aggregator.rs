// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{events::TestPhase, helpers::plural};
use std::fmt;
use swrite::{SWrite, swrite};

/// Coarse progress counters, independent of the category tree.
///
/// Once every test has been reported at least once, `pending + running + succeeded + failed`
/// equals `total`.
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct ProgressStats {
    /// The number of tests being tracked.
    pub total: usize,

    /// The number of tests that have not started.
    pub pending: usize,

    /// The number of tests that are running.
    pub running: usize,

    /// The number of tests that completed successfully.
    pub succeeded: usize,

    /// The number of tests that completed with a failure.
    pub failed: usize,
}

impl ProgressStats {
    /// Returns the number of tests that have completed, successfully or not.
    #[inline]
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Returns true if all tracked tests have completed.
    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.completed() >= self.total
    }

    /// Returns true if any tests failed.
    #[inline]
    pub fn any_failed(&self) -> bool {
        self.failed > 0
    }

    /// Returns a display adapter for the one-line progress message.
    pub fn progress_message(&self) -> ProgressMessage<'_> {
        ProgressMessage { stats: self }
    }

    pub(crate) fn on_test_added(&mut self, phase: TestPhase) {
        self.total += 1;
        *self.counter_mut(phase) += 1;
    }

    pub(crate) fn on_test_removed(&mut self, phase: TestPhase) {
        self.total = self.total.saturating_sub(1);
        let counter = self.counter_mut(phase);
        *counter = counter.saturating_sub(1);
    }

    /// Moves a test from one phase to another. Counters never go below zero, so events that
    /// arrive out of order are tolerated.
    pub(crate) fn on_transition(&mut self, from: TestPhase, to: TestPhase) {
        if from == to {
            return;
        }
        let counter = self.counter_mut(from);
        *counter = counter.saturating_sub(1);
        *self.counter_mut(to) += 1;
    }

    fn counter_mut(&mut self, phase: TestPhase) -> &mut usize {
        match phase {
            TestPhase::NotStarted => &mut self.pending,
            TestPhase::Running => &mut self.running,
            TestPhase::Succeeded => &mut self.succeeded,
            TestPhase::Failed => &mut self.failed,
        }
    }
}

/// The progress line shown above the test tree, e.g. `3 of 10 tests completed (1 test failed)`.
#[derive(Clone, Copy, Debug)]
pub struct ProgressMessage<'a> {
    stats: &'a ProgressStats,
}

impl fmt::Display for ProgressMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats;
        let mut message = if stats.is_finished() {
            format!(
                "All {} {} completed",
                stats.total,
                plural::tests_str(stats.total)
            )
        } else {
            format!(
                "{} of {} {} completed",
                stats.completed(),
                stats.total,
                plural::tests_str(stats.total)
            )
        };
        if stats.any_failed() {
            swrite!(
                message,
                " ({} {} failed)",
                stats.failed,
                plural::tests_str(stats.failed)
            );
        }
        f.write_str(&message)
    }
}
