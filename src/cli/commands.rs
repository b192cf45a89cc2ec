//! CLI command implementations
//!
//! Each command reads one JSON request from stdin and writes one JSON
//! response to stdout. Request-level failures become error responses;
//! configuration and I/O failures are returned to `main`.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response, write_text};
use crate::config::Config;
use crate::observability::{log_event_with_fields, Event, ObservationScope};
use crate::selection::{
    parse_selection, SelectionExplain, SelectionOptions, SelectionResolver, SelectionTerm,
};

/// Request read from stdin
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectionRequest {
    /// Column names in catalog order
    pub catalog: Vec<String>,
    /// Selection text, e.g. `starts_with("x"), -x2`
    #[serde(default)]
    pub selection: String,
    /// Columns always kept (grouping keys)
    #[serde(default)]
    pub include: Vec<String>,
    /// Columns always removed
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl SelectionRequest {
    fn options(&self, config: &Config) -> SelectionOptions {
        config
            .selection_options()
            .with_include(self.include.iter().cloned())
            .with_exclude(self.exclude.iter().cloned())
    }
}

/// Run the CLI
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Dispatch a parsed command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Select { config } => select(config.as_deref()),
        Command::Rename { config } => rename(config.as_deref()),
        Command::Explain { config, text } => explain(config.as_deref(), text),
    }
}

/// select command
pub fn select(config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    respond(receive().and_then(|request| handle_select(&config, &request)))
}

/// rename command
pub fn rename(config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    respond(receive().and_then(|request| handle_rename(&config, &request)))
}

/// explain command
pub fn explain(config_path: Option<&Path>, text: bool) -> CliResult<()> {
    let config = load_config(config_path)?;
    let request = match receive() {
        Ok(request) => request,
        Err(e) => return respond(Err(e)),
    };
    let report = handle_explain(&config, &request);

    if text {
        write_text(&report.to_string())
    } else {
        write_response(serde_json::to_value(&report)?)
    }
}

/// Resolve a selection request to its serialized mapping
pub fn handle_select(config: &Config, request: &SelectionRequest) -> CliResult<Value> {
    let catalog_len = request.catalog.len().to_string();
    let scope = ObservationScope::with_fields("SELECT", &[("catalog", catalog_len.as_str())]);

    let result = parse_terms(config, &request.selection).and_then(|terms| {
        SelectionResolver::new(&request.catalog)
            .with_options(request.options(config))
            .with_trace(config.log_resolutions)
            .resolve(&terms)
            .map_err(CliError::from)
    });

    match result {
        Ok(selection) => {
            let columns = selection.len().to_string();
            scope.complete_with_fields(&[("columns", columns.as_str())]);
            Ok(serde_json::to_value(&selection)?)
        }
        Err(e) => {
            scope.fail(e.code(), &e.to_string());
            Err(e)
        }
    }
}

/// Resolve a rename request to its serialized mapping
pub fn handle_rename(config: &Config, request: &SelectionRequest) -> CliResult<Value> {
    if !request.include.is_empty() || !request.exclude.is_empty() {
        return Err(CliError::request(
            "include and exclude do not apply to rename",
        ));
    }

    let catalog_len = request.catalog.len().to_string();
    let scope = ObservationScope::with_fields("RENAME", &[("catalog", catalog_len.as_str())]);

    let result = parse_terms(config, &request.selection).and_then(|terms| {
        SelectionResolver::new(&request.catalog)
            .with_trace(config.log_resolutions)
            .rename(&terms)
            .map_err(CliError::from)
    });

    match result {
        Ok(selection) => {
            scope.complete();
            Ok(serde_json::to_value(&selection)?)
        }
        Err(e) => {
            scope.fail(e.code(), &e.to_string());
            Err(e)
        }
    }
}

/// Explain a selection request
///
/// Parse failures and the `max_terms` bound are reported inside the
/// explain output.
pub fn handle_explain(config: &Config, request: &SelectionRequest) -> SelectionExplain {
    let scope = ObservationScope::new("EXPLAIN");

    let report = match parse_terms(config, &request.selection) {
        Ok(terms) => SelectionResolver::new(&request.catalog)
            .with_options(request.options(config))
            .with_trace(config.log_resolutions)
            .explain(&terms),
        Err(e) => SelectionExplain::rejected(e.code(), e.to_string()),
    };

    let accepted = report.accepted.to_string();
    log_event_with_fields(Event::ExplainComplete, &[("accepted", accepted.as_str())]);
    scope.complete();
    report
}

fn load_config(path: Option<&Path>) -> CliResult<Config> {
    let config = Config::load_or_default(path)?;
    if path.is_some() {
        let max_terms = config.max_terms.to_string();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("max_terms", max_terms.as_str()),
                ("multi_rename", config.multi_rename.as_str()),
            ],
        );
    }
    Ok(config)
}

fn receive() -> CliResult<SelectionRequest> {
    let request: SelectionRequest = read_request()?;
    let catalog_len = request.catalog.len().to_string();
    log_event_with_fields(Event::RequestReceived, &[("catalog", catalog_len.as_str())]);
    Ok(request)
}

fn parse_terms(config: &Config, text: &str) -> CliResult<Vec<SelectionTerm>> {
    let terms = parse_selection(text)?;
    if terms.len() > config.max_terms {
        return Err(CliError::request(format!(
            "{} terms exceeds max_terms ({})",
            terms.len(),
            config.max_terms
        )));
    }
    Ok(terms)
}

fn respond(result: CliResult<Value>) -> CliResult<()> {
    match result {
        Ok(data) => write_response(data),
        Err(e) if e.is_request_error() => write_error(e.code(), &e.to_string()),
        Err(e) => Err(e),
    }
}
