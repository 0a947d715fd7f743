// Copyright (c) The progress-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{ExpectedError, Result},
    exit_codes::TriageExitCode,
    output::{OutputContext, OutputOpts, OutputWriter, StderrStyles, StdoutStyles, clap_styles},
};
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use itertools::Itertools;
use owo_colors::OwoColorize;
use std::io::Write;
use swrite::{SWrite, swrite, swriteln};
use tracing::debug;
use triage_engine::{
    config::MonitorConfig,
    errors::ConfigWarning,
    events::parse_event_lines,
    helpers::{DisplayErrorChain, plural},
    monitor::ProgressMonitor,
    suite_tree::{SuiteRowKind, SuiteTree},
};

/// Classify test outcomes and decide which tests a progress view shows.
#[derive(Debug, Parser)]
#[command(
    name = "triage",
    version,
    styles = clap_styles::style(),
    max_term_width = 100
)]
pub struct TriageApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(subcommand)]
    command: Command,
}

impl TriageApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        match self.command {
            Command::Replay(opts) => opts.exec(output, output_writer),
            Command::Schema(opts) => opts.exec(output, output_writer),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay a file of lifecycle events and print the resulting classification
    ///
    /// Each line of the file is a JSON object such as
    /// `{"test-id": "app/a", "category": "crash", "has-started": true, "is-complete": true,
    /// "has-failed": true}`. Blank lines and lines starting with `#` are skipped.
    Replay(ReplayOpts),

    /// Print the category tree, with the config key that hides each category
    Schema(SchemaOpts),
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Config options")]
struct ConfigOpts {
    /// Config file [default: built-in defaults]
    #[arg(long, value_name = "PATH", env = "TRIAGE_CONFIG")]
    config: Option<Utf8PathBuf>,
}

impl ConfigOpts {
    fn build_monitor(
        &self,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<ProgressMonitor> {
        let mut warnings: Vec<ConfigWarning> = Vec::new();
        let config = match &self.config {
            Some(path) => MonitorConfig::from_path_with_warnings(path, &mut warnings)?,
            None => MonitorConfig::default(),
        };
        let monitor = ProgressMonitor::with_warnings(&config, &mut warnings);
        report_warnings(&warnings, &output.stderr_styles(), output_writer)?;
        Ok(monitor)
    }
}

fn report_warnings(
    warnings: &[ConfigWarning],
    styles: &StderrStyles,
    output_writer: &mut OutputWriter,
) -> Result<()> {
    if warnings.is_empty() {
        return Ok(());
    }

    let mut writer = output_writer.stderr_writer();
    for warning in warnings {
        writeln!(
            writer,
            "{}: {}",
            "warning".style(styles.warning_text),
            DisplayErrorChain::new(warning),
        )
        .map_err(ExpectedError::write_output_error)?;
    }
    writer.flush().map_err(ExpectedError::write_output_error)
}

#[derive(Debug, Args)]
struct ReplayOpts {
    /// JSON-lines file of lifecycle events
    #[arg(value_name = "EVENTS")]
    events: Utf8PathBuf,

    #[clap(flatten)]
    config: ConfigOpts,

    /// Hide a category once all events are replayed (by id such as `Failed/Crashed`, or by
    /// dotted path such as `failed.crashed`)
    #[arg(long, value_name = "CATEGORY", help_heading = "Display options")]
    hide: Vec<String>,

    /// Show a category once all events are replayed (applied after --hide)
    #[arg(long, value_name = "CATEGORY", help_heading = "Display options")]
    show: Vec<String>,

    /// List every category, including those without tests
    #[arg(long, help_heading = "Display options")]
    all_categories: bool,
}

impl ReplayOpts {
    fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let mut monitor = self.config.build_monitor(output, output_writer)?;

        let toggles: Vec<(&'static str, &str, bool)> = self
            .hide
            .iter()
            .map(|name| ("--hide", name.as_str(), false))
            .chain(self.show.iter().map(|name| ("--show", name.as_str(), true)))
            .collect();
        // Resolve every toggle before doing any work, so typos fail fast.
        for &(option, name, _) in &toggles {
            monitor
                .find_category(name)
                .map_err(|err| ExpectedError::unknown_category(option, err))?;
        }

        let input = std::fs::read_to_string(&self.events)
            .map_err(|err| ExpectedError::events_read_error(&self.events, err))?;
        let events = parse_event_lines(&input)
            .map_err(|err| ExpectedError::events_parse_error(&self.events, err))?;
        debug!("read {} lifecycle events from {}", events.len(), self.events);

        let mut suites = SuiteTree::new();
        for event in &events {
            if suites.insert_test(&event.test_id) {
                monitor.add_test(&event.test_id, &mut suites);
            }
        }
        for event in &events {
            monitor.on_lifecycle_change(event, &mut suites);
        }

        if !toggles.is_empty() {
            debug!(
                "applying toggles: {}",
                toggles
                    .iter()
                    .map(|(option, name, _)| format!("{option} {name}"))
                    .join(", ")
            );
        }
        for &(_, name, visible) in &toggles {
            monitor.on_category_toggle(name, visible, &mut suites);
        }

        let report = render_replay(
            &monitor,
            &suites,
            !self.all_categories,
            &output.stdout_styles(),
        );
        write_stdout(&report, output_writer)?;

        Ok(TriageExitCode::OK)
    }
}

fn render_replay(
    monitor: &ProgressMonitor,
    suites: &SuiteTree,
    populated_only: bool,
    styles: &StdoutStyles,
) -> String {
    let mut out = String::new();

    swriteln!(out, "{}:", "Categories".style(styles.heading));
    swrite!(out, "{}", monitor.summary().populated_only(populated_only));
    swriteln!(out, "{}", monitor.stats().progress_message());
    out.push('\n');

    let rows = suites.visible_rows();
    let visible_tests = rows
        .iter()
        .filter(|row| row.kind == SuiteRowKind::Test)
        .count();
    swriteln!(
        out,
        "{} ({} of {} {}):",
        "Visible tests".style(styles.heading),
        visible_tests.style(styles.count),
        suites.test_count().style(styles.count),
        plural::tests_str(suites.test_count()),
    );
    for row in &rows {
        let indent = "  ".repeat(row.depth + 1);
        match row.kind {
            SuiteRowKind::Suite => {
                swriteln!(out, "{indent}{}/", row.name.style(styles.suite));
            }
            SuiteRowKind::Test => {
                swriteln!(out, "{indent}{}", row.name);
            }
        }
    }

    out
}

#[derive(Debug, Args)]
struct SchemaOpts {
    #[clap(flatten)]
    config: ConfigOpts,
}

impl SchemaOpts {
    fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let monitor = self.config.build_monitor(output, output_writer)?;
        let report = render_schema(&monitor, &output.stdout_styles());
        write_stdout(&report, output_writer)?;
        Ok(TriageExitCode::OK)
    }
}

fn render_schema(monitor: &ProgressMonitor, styles: &StdoutStyles) -> String {
    let tree = monitor.categories();
    let nodes = tree.preorder();
    let width = nodes
        .iter()
        .map(|&index| tree.node(index).id().len())
        .max()
        .unwrap_or(0)
        .max("CATEGORY".len());

    let mut out = String::new();
    swriteln!(
        out,
        "{}  {}",
        format!("{:width$}", "CATEGORY").style(styles.heading),
        "CONFIG KEY".style(styles.heading),
    );
    for index in nodes {
        let node = tree.node(index);
        let key = tree.dotted_path(index).to_lowercase().replace(' ', "_");
        swrite!(out, "{:width$}  hide_{key}", node.id());
        if !node.is_visible() {
            swrite!(out, " {}", "(hidden)".style(styles.hidden));
        }
        out.push('\n');
    }
    swriteln!(
        out,
        "\n{} {}",
        tree.len().style(styles.count),
        plural::categories_str(tree.len()),
    );
    out
}

fn write_stdout(report: &str, output_writer: &mut OutputWriter) -> Result<()> {
    let mut writer = output_writer.stdout_writer();
    writer
        .write_all(report.as_bytes())
        .map_err(ExpectedError::write_output_error)?;
    writer.flush().map_err(ExpectedError::write_output_error)
}
