// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the progress monitor.
//!
//! Configuration is a flat map from keys to lists of values, usually read from a TOML file. The
//! recognized keys are:
//!
//! * `custom_errors`, `custom_crash_errors`, `custom_unrunnable_errors`: lists of custom
//!   categories, each written as `type` or `type{message}`.
//! * `hide_non_started`: hide tests that have not started yet.
//! * `hide_empty_suites`: hide suites whose tests are all hidden.
//! * `hide_<dotted path>`: hide (1) or show (0) a category by default, e.g.
//!   `hide_failed.performance_differences`.
//! * `hide_test_category`: a list of categories to hide by default, each an outcome category tag
//!   (`crash`, `killed`, `bug`, `badPredict`, `unrunnable`, `success`) or a category label.
//!
//! Problems in the configuration are reported through [`ConfigWarnings`] and otherwise ignored.

mod custom;
mod flat;
mod imp;

pub use custom::*;
pub use flat::*;
pub use imp::*;

use crate::errors::ConfigWarning;
use tracing::warn;

/// Receives problems found while interpreting configuration.
///
/// This trait allows for different warning handling strategies, such as logging warnings (the
/// default behavior) or collecting them for testing purposes.
pub trait ConfigWarnings {
    /// Handles a single warning.
    fn warn(&mut self, warning: ConfigWarning);
}

/// Logs configuration warnings through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogConfigWarnings;

impl ConfigWarnings for LogConfigWarnings {
    fn warn(&mut self, warning: ConfigWarning) {
        warn!("{}", crate::helpers::DisplayErrorChain::new(&warning));
    }
}

impl ConfigWarnings for Vec<ConfigWarning> {
    fn warn(&mut self, warning: ConfigWarning) {
        self.push(warning);
    }
}

/// Discards warnings.
#[cfg(test)]
pub(crate) struct NoWarnings;

#[cfg(test)]
impl ConfigWarnings for NoWarnings {
    fn warn(&mut self, _warning: ConfigWarning) {}
}
