// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line front end for `triage-engine`.
//!
//! `triage replay` feeds a JSON-lines file of lifecycle events through a
//! [`ProgressMonitor`](triage_engine::monitor::ProgressMonitor) and prints the resulting category
//! counts and visible tests. `triage schema` prints the category tree for a configuration.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod exit_codes;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
pub use exit_codes::TriageExitCode;
#[doc(hidden)]
pub use output::OutputWriter;
