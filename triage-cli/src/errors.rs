// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    exit_codes::TriageExitCode,
    output::{NO_HEADING_TARGET, StderrStyles},
};
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;
use tracing::{error, info};
use triage_engine::errors::{ConfigReadError, EventParseError, UnknownCategory};

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An error caused by the input given to `triage`, rather than a bug in it.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config read error")]
    ConfigReadError {
        #[from]
        err: ConfigReadError,
    },
    #[error("failed to read events file")]
    EventsReadError {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("failed to parse events file")]
    EventsParseError {
        path: Utf8PathBuf,
        #[source]
        err: EventParseError,
    },
    #[error("unknown category")]
    UnknownCategory {
        option: &'static str,
        #[source]
        err: UnknownCategory,
    },
    #[error("error writing output")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    pub(crate) fn events_read_error(path: impl Into<Utf8PathBuf>, err: std::io::Error) -> Self {
        Self::EventsReadError {
            path: path.into(),
            err,
        }
    }

    pub(crate) fn events_parse_error(path: impl Into<Utf8PathBuf>, err: EventParseError) -> Self {
        Self::EventsParseError {
            path: path.into(),
            err,
        }
    }

    pub(crate) fn unknown_category(option: &'static str, err: UnknownCategory) -> Self {
        Self::UnknownCategory { option, err }
    }

    pub(crate) fn write_output_error(err: std::io::Error) -> Self {
        Self::WriteOutputError { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigReadError { .. } => TriageExitCode::SETUP_ERROR,
            Self::EventsReadError { .. } | Self::EventsParseError { .. } => {
                TriageExitCode::INVALID_EVENTS
            }
            Self::UnknownCategory { .. } => TriageExitCode::UNKNOWN_CATEGORY,
            Self::WriteOutputError { .. } => TriageExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::ConfigReadError { err } => match err {
                ConfigReadError::Read { path, error } => {
                    error!("failed to read config file `{}`", path.style(styles.bold));
                    Some(error as &dyn Error)
                }
                ConfigReadError::Parse { path, error } => {
                    error!("failed to parse config file `{}`", path.style(styles.bold));
                    Some(error as &dyn Error)
                }
            },
            Self::EventsReadError { path, err } => {
                error!("failed to read events from `{}`", path.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::EventsParseError { path, err } => {
                error!(
                    "in `{}`, invalid lifecycle event on line {}",
                    path.style(styles.bold),
                    err.line().style(styles.bold),
                );
                err.source()
            }
            Self::UnknownCategory { option, err } => {
                error!(
                    "{} names an unknown category `{}`",
                    option.style(styles.bold),
                    err.name().style(styles.bold),
                );
                info!(
                    "`{}` lists every category",
                    "triage schema".style(styles.bold)
                );
                None
            }
            Self::WriteOutputError { err } => {
                error!("error writing output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        let err = ExpectedError::write_output_error(std::io::Error::other("closed"));
        assert_eq!(err.process_exit_code(), TriageExitCode::WRITE_OUTPUT_ERROR);

        let err = ExpectedError::events_read_error(
            "events.jsonl",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert_eq!(err.process_exit_code(), TriageExitCode::INVALID_EVENTS);
    }
}
