// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `triage` failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum TriageExitCode {}

impl TriageExitCode {
    /// No errors occurred and `triage` exited normally.
    pub const OK: i32 = 0;

    /// A category named on the command line does not exist.
    pub const UNKNOWN_CATEGORY: i32 = 94;

    /// The configuration file could not be read or parsed.
    pub const SETUP_ERROR: i32 = 96;

    /// The events file could not be read or contained an invalid event.
    pub const INVALID_EVENTS: i32 = 97;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
