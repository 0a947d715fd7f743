// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{ConfigWarnings, CustomCategorySpec, FlatConfig, LogConfigWarnings};
use crate::errors::{ConfigParseError, ConfigReadError, ConfigWarning};
use camino::Utf8Path;
use tracing::debug;

/// A category hide flag from configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HidePath {
    /// The dotted path of the category, e.g. `failed.performance_differences`.
    pub path: String,
    /// Whether the category is hidden (`true`) or shown (`false`) by default.
    pub hide: bool,
}

/// Interpreted configuration for a [`ProgressMonitor`](crate::monitor::ProgressMonitor).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MonitorConfig {
    /// Custom error categories, listed under `Failed`.
    pub custom_errors: Vec<CustomCategorySpec>,

    /// Custom crash categories, listed under `Failed/Crashed`.
    pub custom_crash_errors: Vec<CustomCategorySpec>,

    /// Custom unrunnable categories, listed under `Failed/Unrunnable`.
    pub custom_unrunnable_errors: Vec<CustomCategorySpec>,

    /// Hide tests that have not started yet.
    pub hide_non_started: bool,

    /// Hide suites whose tests are all hidden.
    pub hide_empty_suites: bool,

    /// Per-category hide flags, in configuration order.
    pub hide_paths: Vec<HidePath>,

    /// Categories hidden by default, from `hide_test_category`: outcome category tags such as
    /// `crash` or `success`, or category labels such as `Known bug`.
    pub hide_categories: Vec<String>,
}

impl MonitorConfig {
    /// The default configuration, as TOML.
    ///
    /// User configuration is layered on top of this.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../../default-config.toml");

    const CUSTOM_ERRORS: &'static str = "custom_errors";
    const CUSTOM_CRASH_ERRORS: &'static str = "custom_crash_errors";
    const CUSTOM_UNRUNNABLE_ERRORS: &'static str = "custom_unrunnable_errors";
    const HIDE_NON_STARTED: &'static str = "hide_non_started";
    const HIDE_EMPTY_SUITES: &'static str = "hide_empty_suites";
    const HIDE_TEST_CATEGORY: &'static str = "hide_test_category";
    const HIDE_PREFIX: &'static str = "hide_";

    /// The value in `hide_test_category` that stands for tests that have not started.
    pub const NON_STARTED_CATEGORY: &'static str = "non_started";

    /// Interprets a flat configuration, logging any problems.
    pub fn from_flat(flat: &FlatConfig) -> Self {
        Self::from_flat_with_warnings(flat, &mut LogConfigWarnings)
    }

    /// Interprets a flat configuration, reporting problems to `warnings`.
    ///
    /// Invalid entries are skipped; the rest of the configuration still applies.
    pub fn from_flat_with_warnings(flat: &FlatConfig, warnings: &mut impl ConfigWarnings) -> Self {
        let mut config = Self::default();

        for (key, values) in flat.iter() {
            match key {
                Self::CUSTOM_ERRORS => {
                    config.custom_errors = parse_custom_specs(key, values, warnings);
                }
                Self::CUSTOM_CRASH_ERRORS => {
                    config.custom_crash_errors = parse_custom_specs(key, values, warnings);
                }
                Self::CUSTOM_UNRUNNABLE_ERRORS => {
                    config.custom_unrunnable_errors = parse_custom_specs(key, values, warnings);
                }
                Self::HIDE_NON_STARTED => {
                    if let Some(value) = parse_flag(key, values, warnings) {
                        config.hide_non_started = value;
                    }
                }
                Self::HIDE_EMPTY_SUITES => {
                    if let Some(value) = parse_flag(key, values, warnings) {
                        config.hide_empty_suites = value;
                    }
                }
                Self::HIDE_TEST_CATEGORY => {
                    for category in values {
                        let category = category.trim();
                        if category == Self::NON_STARTED_CATEGORY {
                            config.hide_non_started = true;
                        } else if !category.is_empty() {
                            config.hide_categories.push(category.to_owned());
                        }
                    }
                }
                _ => match key.strip_prefix(Self::HIDE_PREFIX) {
                    Some(path) if !path.is_empty() => {
                        if let Some(hide) = parse_flag(key, values, warnings) {
                            config.hide_paths.push(HidePath {
                                path: path.to_owned(),
                                hide,
                            });
                        }
                    }
                    _ => warnings.warn(ConfigWarning::UnknownKey {
                        key: key.to_owned(),
                    }),
                },
            }
        }

        config
    }

    /// Parses TOML configuration, layered on top of [`DEFAULT_CONFIG`](Self::DEFAULT_CONFIG).
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigParseError> {
        Self::from_toml_str_with_warnings(input, &mut LogConfigWarnings)
    }

    /// Parses TOML configuration, reporting problems to `warnings`.
    pub fn from_toml_str_with_warnings(
        input: &str,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let mut flat = FlatConfig::from_toml_str(Self::DEFAULT_CONFIG)?;
        flat.merge(FlatConfig::from_toml_str(input)?);
        Ok(Self::from_flat_with_warnings(&flat, warnings))
    }

    /// Reads TOML configuration from a file.
    pub fn from_path(path: &Utf8Path) -> Result<Self, ConfigReadError> {
        Self::from_path_with_warnings(path, &mut LogConfigWarnings)
    }

    /// Reads TOML configuration from a file, reporting problems to `warnings`.
    pub fn from_path_with_warnings(
        path: &Utf8Path,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigReadError> {
        debug!("monitor config: loading from {path}");
        let contents = std::fs::read_to_string(path).map_err(|error| ConfigReadError::Read {
            path: path.to_owned(),
            error,
        })?;
        Self::from_toml_str_with_warnings(&contents, warnings).map_err(|error| {
            ConfigReadError::Parse {
                path: path.to_owned(),
                error,
            }
        })
    }
}

fn parse_custom_specs(
    key: &str,
    values: &[String],
    warnings: &mut impl ConfigWarnings,
) -> Vec<CustomCategorySpec> {
    values
        .iter()
        .filter_map(|value| match value.parse() {
            Ok(spec) => Some(spec),
            Err(error) => {
                warnings.warn(ConfigWarning::InvalidCustomCategory {
                    key: key.to_owned(),
                    error,
                });
                None
            }
        })
        .collect()
}

fn parse_flag(key: &str, values: &[String], warnings: &mut impl ConfigWarnings) -> Option<bool> {
    let [value] = values else {
        warnings.warn(ConfigWarning::InvalidValue(
            ConfigParseError::ExpectedSingleValue {
                key: key.to_owned(),
                count: values.len(),
            },
        ));
        return None;
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => {
            warnings.warn(ConfigWarning::InvalidValue(ConfigParseError::InvalidBool {
                key: key.to_owned(),
                value: value.clone(),
            }));
            None
        }
    }
}
