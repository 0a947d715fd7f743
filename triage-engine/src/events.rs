// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle events consumed by the [`ProgressMonitor`](crate::monitor::ProgressMonitor).

use crate::errors::EventParseError;
use serde::Deserialize;
use smol_str::SmolStr;
use std::fmt;

/// The identity of a test.
///
/// Test ids are opaque to the engine. [`SuiteTree`](crate::suite_tree::SuiteTree) interprets `/`
/// as a separator between suite names.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct TestId(SmolStr);

impl TestId {
    /// Creates a new test id.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(SmolStr::new(id))
    }

    /// Returns the test id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TestId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The coarse phase a test is in.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TestPhase {
    /// The test has not started yet.
    NotStarted,

    /// The test is running.
    Running,

    /// The test completed successfully.
    Succeeded,

    /// The test completed with a failure.
    Failed,
}

impl TestPhase {
    /// Returns true if the test has completed, successfully or not.
    pub fn is_complete(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for TestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A change in the state of a test, as reported by the test execution subsystem.
///
/// In JSON form, keys are kebab-case and every field except `test-id` is optional:
///
/// ```json
/// {"test-id": "suite/test", "category": "crash", "has-started": true, "is-complete": true, "has-failed": true}
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LifecycleEvent {
    /// The test this event is for.
    pub test_id: TestId,

    /// The coarse outcome tag, e.g. `crash`, `killed`, `badPredict` or `bug`.
    #[serde(default)]
    pub category: String,

    /// Free-text description of the outcome, e.g. `3% slower, 1 different file`.
    #[serde(default)]
    pub detail: String,

    /// Whether the test has started.
    #[serde(default)]
    pub has_started: bool,

    /// Whether the test has completed.
    #[serde(default)]
    pub is_complete: bool,

    /// Whether the test succeeded.
    #[serde(default)]
    pub has_succeeded: bool,

    /// Whether the test failed.
    #[serde(default)]
    pub has_failed: bool,
}

impl LifecycleEvent {
    /// An event for a test that has not started.
    pub fn not_started(test_id: impl Into<TestId>) -> Self {
        Self {
            test_id: test_id.into(),
            category: String::new(),
            detail: String::new(),
            has_started: false,
            is_complete: false,
            has_succeeded: false,
            has_failed: false,
        }
    }

    /// An event for a test that has started running.
    pub fn started(test_id: impl Into<TestId>) -> Self {
        Self {
            has_started: true,
            ..Self::not_started(test_id)
        }
    }

    /// An event for a test that completed successfully.
    pub fn succeeded(test_id: impl Into<TestId>) -> Self {
        Self {
            category: "success".to_owned(),
            is_complete: true,
            has_succeeded: true,
            ..Self::started(test_id)
        }
    }

    /// An event for a test that completed with a failure.
    pub fn failed(
        test_id: impl Into<TestId>,
        category: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            detail: detail.into(),
            is_complete: true,
            has_failed: true,
            ..Self::started(test_id)
        }
    }

    /// Returns the phase this event puts the test in.
    ///
    /// Completion takes precedence over the started flag. A completed test counts as failed if it
    /// is marked as failed or is not marked as succeeded.
    pub fn phase(&self) -> TestPhase {
        if self.is_complete {
            if self.has_failed || !self.has_succeeded {
                TestPhase::Failed
            } else {
                TestPhase::Succeeded
            }
        } else if self.has_started {
            TestPhase::Running
        } else {
            TestPhase::NotStarted
        }
    }
}

/// Parses a JSON-lines stream of events: one JSON object per line.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_event_lines(input: &str) -> Result<Vec<LifecycleEvent>, EventParseError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(n, line)| {
            serde_json::from_str(line).map_err(|error| EventParseError::new(n + 1, error))
        })
        .collect()
}

impl From<String> for TestId {
    fn from(id: String) -> Self {
        Self(SmolStr::from(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use test_case::test_case;

    #[test_case(LifecycleEvent::not_started("t"), TestPhase::NotStarted ; "not started")]
    #[test_case(LifecycleEvent::started("t"), TestPhase::Running ; "running")]
    #[test_case(LifecycleEvent::succeeded("t"), TestPhase::Succeeded ; "succeeded")]
    #[test_case(LifecycleEvent::failed("t", "crash", ""), TestPhase::Failed ; "failed")]
    #[test_case(
        LifecycleEvent { has_started: false, is_complete: true, has_succeeded: true, ..LifecycleEvent::not_started("t") },
        TestPhase::Succeeded
        ; "complete without started flag"
    )]
    #[test_case(
        LifecycleEvent { is_complete: true, ..LifecycleEvent::started("t") },
        TestPhase::Failed
        ; "complete with neither flag"
    )]
    #[test_case(
        LifecycleEvent { has_succeeded: true, ..LifecycleEvent::failed("t", "", "") },
        TestPhase::Failed
        ; "failure wins over success"
    )]
    fn event_phase(event: LifecycleEvent, expected: TestPhase) {
        assert_eq!(event.phase(), expected);
    }

    #[test]
    fn deserialize_event() {
        let event: LifecycleEvent = serde_json::from_str(
            r#"{"test-id": "suite/a", "category": "crash", "detail": "SIGSEGV",
                "has-started": true, "is-complete": true, "has-failed": true}"#,
        )
        .expect("event is valid");
        assert_eq!(
            event,
            LifecycleEvent::failed("suite/a", "crash", "SIGSEGV"),
            "deserialized event matches"
        );

        let event: LifecycleEvent =
            serde_json::from_str(r#"{"test-id": "suite/b"}"#).expect("event is valid");
        assert_eq!(event.phase(), TestPhase::NotStarted);
    }

    #[test]
    fn parse_lines() {
        let events = parse_event_lines(indoc! {r#"
            # Events from a run.
            {"test-id": "suite/a"}

            {"test-id": "suite/a", "has-started": true}
        "#})
        .expect("events are valid");
        assert_eq!(
            events,
            vec![
                LifecycleEvent::not_started("suite/a"),
                LifecycleEvent::started("suite/a"),
            ]
        );

        let error = parse_event_lines("{\"test-id\": \"a\"}\n{\"category\": \"crash\"}\n")
            .expect_err("missing test id is rejected");
        assert_eq!(error.line(), 2);
    }
}
