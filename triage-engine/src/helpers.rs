// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{error::Error, fmt};

/// Utilities for pluralizing various words based on count or plurality.
pub mod plural {
    /// Returns "test" if `count` is 1, otherwise "tests".
    pub fn tests_str(count: usize) -> &'static str {
        tests_plural_if(count != 1)
    }

    /// Returns "tests" if `plural` is true, otherwise "test".
    pub fn tests_plural_if(plural: bool) -> &'static str {
        if plural { "tests" } else { "test" }
    }

    /// Returns "category" if `count` is 1, otherwise "categories".
    pub fn categories_str(count: usize) -> &'static str {
        if count == 1 { "category" } else { "categories" }
    }
}

/// Displays an error along with all of its sources, separated by `: `.
///
/// With the alternate flag (`{:#}`), each source is printed on its own line instead.
pub struct DisplayErrorChain<E>(E);

impl<E: Error> DisplayErrorChain<E> {
    /// Creates a new chain for the given error.
    pub fn new(error: E) -> Self {
        Self(error)
    }
}

impl<E: Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(error) = source {
            if f.alternate() {
                write!(f, "\n  caused by: {error}")?;
            } else {
                write!(f, ": {error}")?;
            }
            source = error.source();
        }
        Ok(())
    }
}
