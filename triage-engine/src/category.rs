// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The category tree: a fixed taxonomy of test outcomes.
//!
//! The tree is built once, from the built-in schema plus custom categories supplied by
//! configuration, and is never restructured afterwards. Each node tracks the tests currently
//! attributed to it and a user-controlled visibility flag.
//!
//! Counts are not summed up the tree. A test is attributed to every node of its classification
//! path (see [`classifier`](crate::classifier)), and only those nodes count it.

use crate::{
    config::{ConfigWarnings, CustomCategorySpec},
    errors::{ConfigWarning, UnknownCategory},
    events::TestId,
};
use indexmap::IndexSet;
use itertools::Itertools;
use smol_str::{SmolStr, format_smolstr};
use std::{collections::HashMap, fmt};

/// The index of a node within a [`CategoryTree`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// Returns the raw index.
    pub fn as_usize(self) -> usize {
        self.0
    }
}

/// The categories that are always present in a [`CategoryTree`].
///
/// Variants are listed in schema order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BuiltinCategory {
    /// Tests that have not started.
    Pending,
    /// Tests that are running.
    Running,
    /// Tests that succeeded.
    Succeeded,
    /// Tests that failed.
    Failed,
    /// Failed with performance differences.
    PerformanceDifferences,
    /// Ran faster than expected.
    Faster,
    /// Ran slower than expected.
    Slower,
    /// Used less memory than expected.
    LessMemory,
    /// Used more memory than expected.
    MoreMemory,
    /// Exactly one file differed.
    OneDifferentFile,
    /// More than one file differed.
    MultipleDifferentFiles,
    /// Expected files were not produced.
    MissedFiles,
    /// Unexpected files were produced.
    NewFiles,
    /// A known bug was reported.
    KnownBug,
    /// An internal error was detected in the log.
    InternalError,
    /// The system under test crashed.
    Crashed,
    /// The test could not be run.
    Unrunnable,
    /// No results were produced.
    NoResult,
    /// The test was killed.
    Killed,
}

impl BuiltinCategory {
    /// All built-in categories, in schema order.
    pub const ALL: &'static [BuiltinCategory] = &[
        Self::Pending,
        Self::Running,
        Self::Succeeded,
        Self::Failed,
        Self::PerformanceDifferences,
        Self::Faster,
        Self::Slower,
        Self::LessMemory,
        Self::MoreMemory,
        Self::OneDifferentFile,
        Self::MultipleDifferentFiles,
        Self::MissedFiles,
        Self::NewFiles,
        Self::KnownBug,
        Self::InternalError,
        Self::Crashed,
        Self::Unrunnable,
        Self::NoResult,
        Self::Killed,
    ];

    /// Returns the human-readable label for this category.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::PerformanceDifferences => "Performance differences",
            Self::Faster => "Faster",
            Self::Slower => "Slower",
            Self::LessMemory => "Less memory",
            Self::MoreMemory => "More memory",
            Self::OneDifferentFile => "One different file",
            Self::MultipleDifferentFiles => "Multiple different files",
            Self::MissedFiles => "Missed file(s)",
            Self::NewFiles => "New file(s)",
            Self::KnownBug => "Known bug",
            Self::InternalError => "Internal error",
            Self::Crashed => "Crashed",
            Self::Unrunnable => "Unrunnable",
            Self::NoResult => "No result",
            Self::Killed => "Killed",
        }
    }

    /// Returns the parent of this category, or `None` for top-level categories.
    pub fn parent(self) -> Option<BuiltinCategory> {
        match self {
            Self::Pending | Self::Running | Self::Succeeded | Self::Failed => None,
            Self::Faster | Self::Slower | Self::LessMemory | Self::MoreMemory => {
                Some(Self::PerformanceDifferences)
            }
            Self::PerformanceDifferences
            | Self::OneDifferentFile
            | Self::MultipleDifferentFiles
            | Self::MissedFiles
            | Self::NewFiles
            | Self::KnownBug
            | Self::InternalError
            | Self::Crashed
            | Self::Unrunnable => Some(Self::Failed),
            Self::NoResult | Self::Killed => Some(Self::Unrunnable),
        }
    }

    /// Returns the index of this category's node. Built-in nodes occupy the first slots of every
    /// tree, in schema order.
    pub fn index(self) -> NodeIndex {
        NodeIndex(self as usize)
    }

    /// Returns the kind of custom categories attached under this category, if any.
    fn custom_kind(self) -> Option<CustomCategoryKind> {
        match self {
            Self::Failed => Some(CustomCategoryKind::Error),
            Self::Crashed => Some(CustomCategoryKind::Crash),
            Self::Unrunnable => Some(CustomCategoryKind::Unrunnable),
            _ => None,
        }
    }

    /// Where custom categories are spliced into this category's children.
    fn custom_insert_position(self) -> usize {
        match self {
            // After "Performance differences".
            Self::Failed => 1,
            _ => 0,
        }
    }
}

/// The kind of a configured custom category.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CustomCategoryKind {
    /// A custom error, listed under `Failed`.
    Error,
    /// A custom crash, listed under `Failed/Crashed`.
    Crash,
    /// A custom reason for being unrunnable, listed under `Failed/Unrunnable`.
    Unrunnable,
}

impl CustomCategoryKind {
    /// Returns the built-in category custom nodes of this kind are attached to.
    pub fn parent(self) -> BuiltinCategory {
        match self {
            Self::Error => BuiltinCategory::Failed,
            Self::Crash => BuiltinCategory::Crashed,
            Self::Unrunnable => BuiltinCategory::Unrunnable,
        }
    }
}

/// A custom category attached to the tree.
#[derive(Clone, Debug)]
pub struct CustomCategory {
    /// The kind of custom category.
    pub kind: CustomCategoryKind,
    /// The token searched for in outcome details.
    pub match_token: SmolStr,
    /// The node for this category.
    pub node: NodeIndex,
}

/// A node in the [`CategoryTree`].
#[derive(Clone, Debug)]
pub struct CategoryNode {
    id: SmolStr,
    label: SmolStr,
    visible: bool,
    depth: usize,
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
    // Invariant: a test appears at most once, so the count is the set's length.
    members: IndexSet<TestId>,
}

impl CategoryNode {
    fn new(id: SmolStr, label: SmolStr, parent: Option<NodeIndex>, depth: usize) -> Self {
        Self {
            id,
            label,
            visible: true,
            depth,
            parent,
            children: Vec::new(),
            members: IndexSet::new(),
        }
    }

    /// The stable identifier of this node: labels from the root joined with `/`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The human-readable name of this node.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The number of tests currently attributed to this node.
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Whether tests owned by this node are shown.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The depth of this node. Top-level nodes have depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The parent of this node.
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// The children of this node, in schema order.
    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    /// The tests currently attributed to this node, in the order they were attributed.
    pub fn members(&self) -> impl ExactSizeIterator<Item = &TestId> + '_ {
        self.members.iter()
    }
}

/// The taxonomy of test outcomes.
#[derive(Clone, Debug)]
pub struct CategoryTree {
    nodes: Vec<CategoryNode>,
    roots: Vec<NodeIndex>,
    by_id: HashMap<SmolStr, NodeIndex>,
    custom: Vec<CustomCategory>,
}

impl CategoryTree {
    /// Builds the tree from the built-in schema and the given custom categories.
    ///
    /// Custom categories whose id collides with an existing category are reported to `warnings`
    /// and skipped.
    pub fn build(
        custom_errors: &[CustomCategorySpec],
        custom_crashes: &[CustomCategorySpec],
        custom_unrunnables: &[CustomCategorySpec],
        warnings: &mut impl ConfigWarnings,
    ) -> Self {
        let mut tree = Self {
            nodes: Vec::with_capacity(BuiltinCategory::ALL.len()),
            roots: Vec::new(),
            by_id: HashMap::new(),
            custom: Vec::new(),
        };

        // Built-in nodes are created first so that `BuiltinCategory::index` is valid. ALL lists
        // parents before children.
        for &builtin in BuiltinCategory::ALL {
            let parent = builtin.parent().map(BuiltinCategory::index);
            let index = tree.push_node(parent, builtin.label());
            debug_assert_eq!(index, builtin.index(), "built-in nodes are created in order");
        }

        let mut custom_children: HashMap<BuiltinCategory, Vec<NodeIndex>> = HashMap::new();
        for (kind, specs) in [
            (CustomCategoryKind::Error, custom_errors),
            (CustomCategoryKind::Crash, custom_crashes),
            (CustomCategoryKind::Unrunnable, custom_unrunnables),
        ] {
            let parent = kind.parent();
            for spec in specs {
                let id = format_smolstr!("{}/{}", tree.node(parent.index()).id, spec.message());
                if tree.by_id.contains_key(&id) {
                    warnings.warn(ConfigWarning::DuplicateCustomCategory { id });
                    continue;
                }
                let node = tree.push_node(Some(parent.index()), spec.message());
                tree.custom.push(CustomCategory {
                    kind,
                    match_token: SmolStr::new(spec.match_token()),
                    node,
                });
                custom_children.entry(parent).or_default().push(node);
            }
        }

        for &builtin in BuiltinCategory::ALL {
            let mut children: Vec<NodeIndex> = BuiltinCategory::ALL
                .iter()
                .filter(|child| child.parent() == Some(builtin))
                .map(|child| child.index())
                .collect();
            if builtin.custom_kind().is_some() {
                if let Some(custom) = custom_children.remove(&builtin) {
                    let at = builtin.custom_insert_position();
                    children.splice(at..at, custom);
                }
            }
            if builtin.parent().is_none() {
                tree.roots.push(builtin.index());
            }
            tree.nodes[builtin.index().0].children = children;
        }

        tree
    }

    fn push_node(&mut self, parent: Option<NodeIndex>, label: &str) -> NodeIndex {
        let (id, depth) = match parent {
            Some(parent) => {
                let parent = &self.nodes[parent.0];
                (format_smolstr!("{}/{}", parent.id, label), parent.depth + 1)
            }
            None => (SmolStr::new(label), 0),
        };
        let index = NodeIndex(self.nodes.len());
        self.by_id.insert(id.clone(), index);
        self.nodes
            .push(CategoryNode::new(id, SmolStr::new(label), parent, depth));
        index
    }

    /// Returns the node at the given index.
    ///
    /// # Panics
    ///
    /// Panics if the index did not come from this tree.
    pub fn node(&self, index: NodeIndex) -> &CategoryNode {
        &self.nodes[index.0]
    }

    /// Returns the node with the given id, e.g. `Failed/Crashed`.
    pub fn get(&self, id: &str) -> Option<NodeIndex> {
        self.by_id.get(id).copied()
    }

    /// Returns the number of tests attributed to the node with the given id.
    pub fn count_of(&self, id: &str) -> Option<usize> {
        self.get(id).map(|index| self.node(index).count())
    }

    /// Returns whether the node with the given id is visible.
    pub fn is_visible(&self, id: &str) -> Option<bool> {
        self.get(id).map(|index| self.node(index).visible)
    }

    /// Returns the top-level nodes, in schema order.
    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    /// Returns the number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no nodes. Never true for a built tree.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the custom categories that were attached, in configuration order.
    pub fn custom_categories(&self) -> &[CustomCategory] {
        &self.custom
    }

    /// Returns all nodes in pre-order (schema order, parents before children).
    pub fn preorder(&self) -> Vec<NodeIndex> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeIndex> = self.roots.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            out.push(index);
            stack.extend(self.nodes[index.0].children.iter().rev().copied());
        }
        out
    }

    /// Returns `index` and all its descendants, in pre-order.
    pub fn descendants(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack = vec![index];
        while let Some(index) = stack.pop() {
            out.push(index);
            stack.extend(self.nodes[index.0].children.iter().rev().copied());
        }
        out
    }

    /// Returns true if `index` is `ancestor` or one of its descendants.
    pub fn is_within(&self, index: NodeIndex, ancestor: NodeIndex) -> bool {
        let mut current = Some(index);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.nodes[node.0].parent;
        }
        false
    }

    /// Returns the dotted path of a node: its labels from the root joined with `.`.
    pub fn dotted_path(&self, index: NodeIndex) -> String {
        let mut labels = Vec::with_capacity(self.nodes[index.0].depth + 1);
        let mut current = Some(index);
        while let Some(node) = current {
            labels.push(self.nodes[node.0].label.as_str());
            current = self.nodes[node.0].parent;
        }
        labels.iter().rev().join(".")
    }

    /// Resolves a dotted path such as `failed.performance_differences.slower`.
    ///
    /// Matching is case-insensitive and treats spaces and underscores as equal.
    pub fn find_dotted(&self, path: &str) -> Option<NodeIndex> {
        let wanted = normalize(path);
        self.preorder()
            .into_iter()
            .find(|&index| normalize(&self.dotted_path(index)) == wanted)
    }

    /// Finds the first node, in pre-order, whose label matches `label` with the same leniency
    /// as [`find_dotted`](Self::find_dotted).
    pub fn find_by_label(&self, label: &str) -> Option<NodeIndex> {
        let wanted = normalize(label);
        self.preorder()
            .into_iter()
            .find(|&index| normalize(&self.nodes[index.0].label) == wanted)
    }

    /// Looks a node up by id, then by dotted path.
    pub fn find(&self, name: &str) -> Result<NodeIndex, UnknownCategory> {
        self.get(name)
            .or_else(|| self.find_dotted(name))
            .ok_or_else(|| UnknownCategory::new(name))
    }

    /// Sets the visibility of a node and all its descendants.
    ///
    /// Counts are never affected. Returns the nodes that were updated, in pre-order.
    pub fn set_visible(&mut self, index: NodeIndex, visible: bool) -> Vec<NodeIndex> {
        let subtree = self.descendants(index);
        for &node in &subtree {
            self.nodes[node.0].visible = visible;
        }
        subtree
    }

    /// Applies configured hide flags at startup.
    ///
    /// Each entry is a node and whether it should be hidden. Entries are applied shallowest first
    /// and cascade to descendants, so a more specific entry overrides a less specific one.
    pub fn apply_config_defaults(&mut self, hide_flags: &[(NodeIndex, bool)]) {
        let mut ordered = hide_flags.to_vec();
        // sort_by_key is stable, so entries at the same depth keep configuration order.
        ordered.sort_by_key(|(index, _)| self.nodes[index.0].depth);
        for (index, hide) in ordered {
            self.set_visible(index, !hide);
        }
    }

    /// Attributes a test to a node. Returns true if the test was not already attributed.
    pub(crate) fn insert_member(&mut self, index: NodeIndex, test: &TestId) -> bool {
        self.nodes[index.0].members.insert(test.clone())
    }

    /// Removes a test from a node. Returns true if the test was attributed to it.
    pub(crate) fn remove_member(&mut self, index: NodeIndex, test: &TestId) -> bool {
        // shift_remove keeps attribution order for the remaining members.
        self.nodes[index.0].members.shift_remove(test)
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c == ' ' { '_' } else { c.to_ascii_lowercase() })
        .collect()
}
