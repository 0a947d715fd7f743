// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping test outcomes to paths in the [`CategoryTree`].
//!
//! A failed outcome can match several rules at once: a test that is both slower and has a
//! different file is attributed to `Performance differences`, `Slower` and `One different
//! file`. All matched nodes are returned, in rule order, each at most once.

use crate::{
    category::{BuiltinCategory, CategoryTree, CustomCategoryKind, NodeIndex},
    events::TestPhase,
};
use smallvec::SmallVec;
use smol_str::SmolStr;

/// The path a classification attributes a test to.
pub type ClassificationPath = SmallVec<[NodeIndex; 4]>;

/// The result of classifying an outcome.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Classification {
    path: ClassificationPath,
    owner: NodeIndex,
    unrunnable_caught: bool,
}

impl Classification {
    fn single(node: BuiltinCategory) -> Self {
        let mut path = ClassificationPath::new();
        path.push(node.index());
        Self {
            path,
            owner: node.index(),
            unrunnable_caught: false,
        }
    }

    /// The nodes the test is attributed to, in rule order. Never empty, and never contains a
    /// node twice.
    pub fn path(&self) -> &[NodeIndex] {
        &self.path
    }

    /// Consumes the classification, returning its path.
    pub fn into_path(self) -> ClassificationPath {
        self.path
    }

    /// The most specific node: the last one in the path. Its visibility decides the test's.
    pub fn owner(&self) -> NodeIndex {
        self.owner
    }

    /// True if the outcome was attributed to `Unrunnable` by the `killed` or `unrunnable`
    /// categories.
    pub fn unrunnable_caught(&self) -> bool {
        self.unrunnable_caught
    }
}

/// Classifies test outcomes against a [`CategoryTree`].
#[derive(Clone, Debug)]
pub struct OutcomeClassifier {
    custom_errors: Vec<(SmolStr, NodeIndex)>,
    custom_crashes: Vec<(SmolStr, NodeIndex)>,
    custom_unrunnables: Vec<(SmolStr, NodeIndex)>,
}

impl OutcomeClassifier {
    /// Outcome category for a failed prediction check.
    pub const CATEGORY_BAD_PREDICT: &'static str = "badPredict";
    /// Outcome category for a known bug.
    pub const CATEGORY_BUG: &'static str = "bug";
    /// Outcome category for a killed test.
    pub const CATEGORY_KILLED: &'static str = "killed";
    /// Outcome category for a crash.
    pub const CATEGORY_CRASH: &'static str = "crash";
    /// Outcome category for a test that could not be run.
    pub const CATEGORY_UNRUNNABLE: &'static str = "unrunnable";
    /// Outcome category for a test that passed.
    pub const CATEGORY_SUCCESS: &'static str = "success";

    /// Returns the node an outcome category tag stands for, such as `Crashed` for `crash`.
    ///
    /// Matching ignores ASCII case. Returns `None` for tags without a dedicated node.
    pub fn category_node(category: &str) -> Option<BuiltinCategory> {
        [
            (Self::CATEGORY_CRASH, BuiltinCategory::Crashed),
            (Self::CATEGORY_KILLED, BuiltinCategory::Killed),
            (Self::CATEGORY_BUG, BuiltinCategory::KnownBug),
            (Self::CATEGORY_BAD_PREDICT, BuiltinCategory::InternalError),
            (Self::CATEGORY_UNRUNNABLE, BuiltinCategory::Unrunnable),
            (Self::CATEGORY_SUCCESS, BuiltinCategory::Succeeded),
        ]
        .into_iter()
        .find_map(|(tag, node)| tag.eq_ignore_ascii_case(category).then_some(node))
    }

    /// Creates a classifier for the custom categories attached to `tree`.
    pub fn new(tree: &CategoryTree) -> Self {
        let mut classifier = Self {
            custom_errors: Vec::new(),
            custom_crashes: Vec::new(),
            custom_unrunnables: Vec::new(),
        };
        for custom in tree.custom_categories() {
            let entry = (custom.match_token.clone(), custom.node);
            match custom.kind {
                CustomCategoryKind::Error => classifier.custom_errors.push(entry),
                CustomCategoryKind::Crash => classifier.custom_crashes.push(entry),
                CustomCategoryKind::Unrunnable => classifier.custom_unrunnables.push(entry),
            }
        }
        classifier
    }

    /// Classifies an outcome.
    ///
    /// Tests that are not complete, or that succeeded, go to a single top-level node. Failures are
    /// matched against `category` and `detail`; substring matches are case-sensitive.
    pub fn classify(&self, phase: TestPhase, category: &str, detail: &str) -> Classification {
        match phase {
            TestPhase::NotStarted => Classification::single(BuiltinCategory::Pending),
            TestPhase::Running => Classification::single(BuiltinCategory::Running),
            TestPhase::Succeeded => Classification::single(BuiltinCategory::Succeeded),
            TestPhase::Failed => self.classify_failure(category, detail),
        }
    }

    fn classify_failure(&self, category: &str, detail: &str) -> Classification {
        use BuiltinCategory::*;

        let mut path = PathBuilder::default();
        let mut unrunnable_caught = false;

        if detail.contains("no results") {
            path.push_builtin(NoResult);
        }
        for (needle, node) in [
            (" slower", Slower),
            (" faster", Faster),
            (" smaller", LessMemory),
            (" larger", MoreMemory),
        ] {
            if detail.contains(needle) {
                path.push_builtin(PerformanceDifferences);
                path.push_builtin(node);
            }
        }
        if detail.contains(" new") {
            path.push_builtin(NewFiles);
        }
        if detail.contains(" missing") {
            path.push_builtin(MissedFiles);
        }
        if category == Self::CATEGORY_BAD_PREDICT {
            path.push_builtin(InternalError);
        }
        path.push_matching(&self.custom_errors, detail);

        // Exclusive: " different(+)" also contains " different".
        if detail.contains(" different(+)") {
            path.push_builtin(MultipleDifferentFiles);
        } else if detail.contains(" different") {
            path.push_builtin(OneDifferentFile);
        }

        if category == Self::CATEGORY_BUG {
            path.push_builtin(KnownBug);
        }
        if category == Self::CATEGORY_KILLED {
            path.push_builtin(Unrunnable);
            path.push_builtin(Killed);
            unrunnable_caught = true;
        }
        if category == Self::CATEGORY_CRASH {
            path.push_builtin(Crashed);
            path.push_matching(&self.custom_crashes, detail);
        }
        if category == Self::CATEGORY_UNRUNNABLE {
            path.push_builtin(Unrunnable);
            path.push_matching(&self.custom_unrunnables, detail);
            unrunnable_caught = true;
        }

        let owner = match path.0.last().copied() {
            Some(owner) => owner,
            None => {
                path.push_builtin(Failed);
                Failed.index()
            }
        };

        Classification {
            path: path.0,
            owner,
            unrunnable_caught,
        }
    }
}

#[derive(Default)]
struct PathBuilder(ClassificationPath);

impl PathBuilder {
    fn push(&mut self, node: NodeIndex) {
        if !self.0.contains(&node) {
            self.0.push(node);
        }
    }

    fn push_builtin(&mut self, node: BuiltinCategory) {
        self.push(node.index());
    }

    fn push_matching(&mut self, custom: &[(SmolStr, NodeIndex)], detail: &str) {
        for (token, node) in custom {
            if detail.contains(token.as_str()) {
                self.push(*node);
            }
        }
    }
}
