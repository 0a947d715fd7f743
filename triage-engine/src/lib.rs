// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Test outcome classification and visibility for test progress monitors.
//!
//! The engine keeps a fixed taxonomy of test outcomes (the [category tree](category)), attributes
//! each test to a path of nodes as its state changes, and decides which tests and suites a
//! display should show. It performs no I/O and draws nothing: callers feed it
//! [lifecycle events](events::LifecycleEvent) and implement
//! [`DisplayHierarchy`](visibility::DisplayHierarchy) for their own view, or use the in-memory
//! [`SuiteTree`](suite_tree::SuiteTree).
//!
//! The entry point is [`ProgressMonitor`](monitor::ProgressMonitor):
//!
//! ```
//! use triage_engine::{
//!     config::MonitorConfig,
//!     events::{LifecycleEvent, TestId},
//!     monitor::ProgressMonitor,
//!     suite_tree::SuiteTree,
//! };
//!
//! let mut monitor = ProgressMonitor::new(&MonitorConfig::default());
//! let mut suites = SuiteTree::new();
//!
//! let test = TestId::new("parser/empty_input");
//! suites.insert_test(&test);
//! monitor.add_test(&test, &mut suites);
//!
//! let event = LifecycleEvent::failed("parser/empty_input", "", "3% slower, 1 different file");
//! monitor.on_lifecycle_change(&event, &mut suites);
//! assert_eq!(monitor.count_of("Failed/Performance differences/Slower"), Some(1));
//! assert_eq!(monitor.count_of("Failed/One different file"), Some(1));
//!
//! monitor.on_category_toggle("Failed", false, &mut suites);
//! assert_eq!(suites.is_test_visible(&test), Some(false));
//! ```

pub mod aggregator;
pub mod category;
pub mod classifier;
pub mod config;
pub mod errors;
pub mod events;
pub mod helpers;
pub mod index;
pub mod monitor;
pub mod suite_tree;
pub mod summary;
pub mod visibility;
