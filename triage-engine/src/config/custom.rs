// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::CustomCategoryParseError;
use smol_str::SmolStr;
use std::{fmt, str::FromStr};

/// A custom category from configuration, written as `type` or `type{message}`.
///
/// `type` is the token searched for in outcome details, and `message` is the label shown for the
/// category. The message defaults to the token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CustomCategorySpec {
    match_token: SmolStr,
    message: Option<SmolStr>,
}

impl CustomCategorySpec {
    /// Creates a new specification.
    pub fn new(match_token: impl AsRef<str>, message: Option<&str>) -> Self {
        Self {
            match_token: SmolStr::new(match_token),
            message: message.map(SmolStr::new),
        }
    }

    /// The token searched for in outcome details.
    pub fn match_token(&self) -> &str {
        &self.match_token
    }

    /// The label shown for this category.
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(&self.match_token)
    }
}

impl FromStr for CustomCategorySpec {
    type Err = CustomCategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(CustomCategoryParseError::new(s, "specification is empty"));
        }

        let Some((token, rest)) = input.split_once('{') else {
            if input.contains('}') {
                return Err(CustomCategoryParseError::new(s, "unbalanced braces"));
            }
            return Ok(Self::new(input, None));
        };

        let token = token.trim();
        if token.is_empty() {
            return Err(CustomCategoryParseError::new(s, "missing type before `{`"));
        }
        let Some(message) = rest.strip_suffix('}') else {
            return Err(CustomCategoryParseError::new(
                s,
                "expected `}` at the end of the message",
            ));
        };
        if message.contains(['{', '}']) {
            return Err(CustomCategoryParseError::new(s, "unbalanced braces"));
        }
        let message = message.trim();
        if message.is_empty() {
            return Err(CustomCategoryParseError::new(s, "message is empty"));
        }

        Ok(Self::new(token, Some(message)))
    }
}

impl fmt::Display for CustomCategorySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}{{{}}}", self.match_token, message),
            None => write!(f, "{}", self.match_token),
        }
    }
}
