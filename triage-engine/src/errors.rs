// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the triage engine.
//!
//! Nothing in the engine core performs I/O, so most of these are configuration problems. They are
//! reported once, through [`ConfigWarnings`](crate::config::ConfigWarnings), and otherwise
//! ignored.

use camino::Utf8PathBuf;
use smol_str::SmolStr;
use std::{borrow::Cow, io};
use thiserror::Error;

/// An error that occurred while parsing a custom category specification.
///
/// Custom categories are written as `type` or `type{message}`.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("invalid custom category `{input}`: {reason}")]
pub struct CustomCategoryParseError {
    input: String,
    reason: Cow<'static, str>,
}

impl CustomCategoryParseError {
    pub(crate) fn new(input: impl Into<String>, reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Returns the input that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// An error that occurred while interpreting configuration values.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseError {
    /// The input was not valid TOML.
    #[error("failed to parse TOML")]
    Toml(#[from] toml::de::Error),

    /// A TOML value had a shape that cannot be flattened into a list of strings.
    #[error("unsupported value for `{key}`: {kind} (expected a scalar or an array of scalars)")]
    UnsupportedValue {
        /// The configuration key.
        key: String,
        /// The kind of value that was found.
        kind: &'static str,
    },

    /// A flag was not a recognized boolean.
    #[error("invalid value `{value}` for `{key}` (expected 0, 1, true or false)")]
    InvalidBool {
        /// The configuration key.
        key: String,
        /// The value that was found.
        value: String,
    },

    /// A flag was given several values.
    #[error("`{key}` takes a single value, found {count}")]
    ExpectedSingleValue {
        /// The configuration key.
        key: String,
        /// The number of values that were found.
        count: usize,
    },
}

/// An error that occurred while reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigReadError {
    /// The file could not be read.
    #[error("failed to read config file `{path}`")]
    Read {
        /// The path to the config file.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The file could not be parsed.
    #[error("failed to parse config file `{path}`")]
    Parse {
        /// The path to the config file.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: ConfigParseError,
    },
}

/// A configured hide path did not resolve to any category.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("no category matches `{path}`")]
pub struct UnknownHidePath {
    path: String,
}

impl UnknownHidePath {
    pub(crate) fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path that did not resolve.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// A category name or id was not found in the category tree.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unknown category `{name}`")]
pub struct UnknownCategory {
    name: String,
}

impl UnknownCategory {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the name that was looked up.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A problem found in the configuration that was reported and then ignored.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigWarning {
    /// A configuration key was not recognized.
    #[error("ignoring unknown configuration key `{key}`")]
    UnknownKey {
        /// The unknown key.
        key: String,
    },

    /// A configuration value could not be interpreted.
    #[error("ignoring invalid configuration value")]
    InvalidValue(#[source] ConfigParseError),

    /// A custom category specification could not be parsed.
    #[error("in `{key}`, ignoring custom category")]
    InvalidCustomCategory {
        /// The key the specification was listed under.
        key: String,
        /// The parse error.
        #[source]
        error: CustomCategoryParseError,
    },

    /// A custom category has the same id as another category.
    #[error("ignoring custom category `{id}`: a category with this id already exists")]
    DuplicateCustomCategory {
        /// The id of the duplicate category.
        id: SmolStr,
    },

    /// A hide option named a category that does not exist.
    #[error("ignoring hide option")]
    UnknownHidePath(#[source] UnknownHidePath),
}

/// An error that occurred while parsing a stream of lifecycle events.
#[derive(Debug, Error)]
#[error("invalid lifecycle event on line {line}")]
pub struct EventParseError {
    line: usize,
    #[source]
    error: serde_json::Error,
}

impl EventParseError {
    pub(crate) fn new(line: usize, error: serde_json::Error) -> Self {
        Self { line, error }
    }

    /// Returns the 1-based line number of the invalid event.
    pub fn line(&self) -> usize {
        self.line
    }
}
