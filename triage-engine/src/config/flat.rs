// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::ConfigParseError;
use indexmap::IndexMap;
use toml::{Table, Value};

/// A flat map from configuration keys to lists of values.
///
/// This is the form configuration takes before it is interpreted by
/// [`MonitorConfig`](super::MonitorConfig). Keys keep their insertion order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FlatConfig {
    entries: IndexMap<String, Vec<String>>,
}

impl FlatConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the values for a key, replacing any previous values.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) {
        self.entries
            .insert(key.into(), values.into_iter().map(Into::into).collect());
    }

    /// Returns the values for a key.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Iterates over keys and values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> + '_ {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Layers `other` on top of `self`: keys in `other` replace keys in `self`.
    pub fn merge(&mut self, other: FlatConfig) {
        for (key, values) in other.entries {
            self.entries.insert(key, values);
        }
    }

    /// Parses TOML into a flat configuration.
    ///
    /// Every top-level key must be a scalar or an array of scalars. Booleans become `1` or `0`.
    /// As a convenience, a `[hide]` table is flattened into `hide_<key>` entries:
    ///
    /// ```toml
    /// [hide]
    /// "failed.performance_differences" = true
    /// ```
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigParseError> {
        let table: Table = input.parse()?;
        let mut config = Self::new();
        for (key, value) in table {
            match value {
                Value::Table(hide) if key == "hide" => {
                    for (path, value) in hide {
                        let key = format!("hide_{path}");
                        let values = flatten_value(&key, value)?;
                        config.entries.insert(key, values);
                    }
                }
                value => {
                    let values = flatten_value(&key, value)?;
                    config.entries.insert(key, values);
                }
            }
        }
        Ok(config)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, Vec<V>)> for FlatConfig {
    fn from_iter<T: IntoIterator<Item = (K, Vec<V>)>>(iter: T) -> Self {
        let mut config = Self::new();
        for (key, values) in iter {
            config.insert(key, values);
        }
        config
    }
}

fn flatten_value(key: &str, value: Value) -> Result<Vec<String>, ConfigParseError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|value| scalar_to_string(key, value))
            .collect(),
        value => Ok(vec![scalar_to_string(key, value)?]),
    }
}

fn scalar_to_string(key: &str, value: Value) -> Result<String, ConfigParseError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(if b { "1" } else { "0" }.to_owned()),
        Value::Datetime(_) => Err(unsupported(key, "datetime")),
        Value::Array(_) => Err(unsupported(key, "nested array")),
        Value::Table(_) => Err(unsupported(key, "table")),
    }
}

fn unsupported(key: &str, kind: &'static str) -> ConfigParseError {
    ConfigParseError::UnsupportedValue {
        key: key.to_owned(),
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn flatten_toml() {
        let config = FlatConfig::from_toml_str(indoc! {r#"
            custom_errors = ["TIMEOUT{Timed out}", "OOM"]
            hide_non_started = 1
            hide_empty_suites = true
            "hide_failed.known_bug" = false

            [hide]
            "failed.performance_differences" = true
        "#})
        .expect("config is valid");

        let expected: FlatConfig = [
            ("custom_errors", vec!["TIMEOUT{Timed out}", "OOM"]),
            ("hide_non_started", vec!["1"]),
            ("hide_empty_suites", vec!["1"]),
            ("hide_failed.known_bug", vec!["0"]),
            ("hide_failed.performance_differences", vec!["1"]),
        ]
        .into_iter()
        .collect();
        // toml tables are sorted by key, so compare as sorted lists.
        let mut actual: Vec<_> = config.iter().collect();
        actual.sort();
        let mut expected: Vec<_> = expected.iter().collect();
        expected.sort();
        assert_eq!(actual, expected);
    }

    #[test]
    fn reject_unsupported_values() {
        let error = FlatConfig::from_toml_str("custom_errors = [[\"a\"]]")
            .expect_err("nested arrays are rejected");
        assert!(
            matches!(
                error,
                ConfigParseError::UnsupportedValue { ref key, kind: "nested array" } if key == "custom_errors"
            ),
            "unexpected error: {error:?}"
        );

        let error =
            FlatConfig::from_toml_str("[ui]\ncolor = 1").expect_err("other tables are rejected");
        assert!(
            matches!(error, ConfigParseError::UnsupportedValue { kind: "table", .. }),
            "unexpected error: {error:?}"
        );

        FlatConfig::from_toml_str("custom_errors = [").expect_err("invalid TOML is rejected");
    }

    #[test]
    fn merge_replaces_keys() {
        let mut base: FlatConfig = [
            ("hide_non_started", vec!["0"]),
            ("custom_errors", vec!["A"]),
        ]
        .into_iter()
        .collect();
        let top: FlatConfig = [("custom_errors", vec!["B", "C"])].into_iter().collect();
        base.merge(top);

        assert_eq!(base.get("hide_non_started"), Some(&["0".to_owned()][..]));
        assert_eq!(
            base.get("custom_errors"),
            Some(&["B".to_owned(), "C".to_owned()][..])
        );
    }
}
