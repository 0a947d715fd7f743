// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::category::CategoryTree;
use std::fmt;

/// A plain-text dump of a [`CategoryTree`], one node per line:
///
/// ```text
/// --> Pending : 0
/// --> Failed : 0
/// ----> Performance differences : 1
/// ------> Slower : 1
/// ```
///
/// Hidden nodes are marked with ` (hidden)`.
#[derive(Clone, Copy, Debug)]
pub struct CategorySummary<'a> {
    tree: &'a CategoryTree,
    populated_only: bool,
}

impl<'a> CategorySummary<'a> {
    /// Creates a summary of every node in `tree`.
    pub fn new(tree: &'a CategoryTree) -> Self {
        Self {
            tree,
            populated_only: false,
        }
    }

    /// If true, only nodes with tests, and the ancestors of those nodes, are listed.
    pub fn populated_only(mut self, populated_only: bool) -> Self {
        self.populated_only = populated_only;
        self
    }
}

impl CategorySummary<'_> {
    fn populated_with_ancestors(&self) -> Vec<bool> {
        let mut listed = vec![false; self.tree.len()];
        for index in self.tree.preorder() {
            if self.tree.node(index).count() == 0 {
                continue;
            }
            let mut current = Some(index);
            while let Some(node) = current {
                if listed[node.as_usize()] {
                    break;
                }
                listed[node.as_usize()] = true;
                current = self.tree.node(node).parent();
            }
        }
        listed
    }
}

impl fmt::Display for CategorySummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listed = self.populated_only.then(|| self.populated_with_ancestors());
        for index in self.tree.preorder() {
            if listed
                .as_ref()
                .is_some_and(|listed| !listed[index.as_usize()])
            {
                continue;
            }
            let node = self.tree.node(index);
            write!(
                f,
                "{}> {} : {}",
                "--".repeat(node.depth() + 1),
                node.label(),
                node.count()
            )?;
            if !node.is_visible() {
                write!(f, " (hidden)")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
