// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the progress monitor: classification, counts and visibility driven
//! through the public API only.

mod fixtures;
mod properties;
mod scenarios;
