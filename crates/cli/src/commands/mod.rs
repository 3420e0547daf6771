pub mod catalog;
pub mod config;
pub mod estimate;
pub mod quote;

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use wrh_quote_core::config::{AppConfig, LoadOptions};
use wrh_quote_core::cpq::catalog::PricingCatalog;
use wrh_quote_core::domain::QuoteFormData;
use wrh_quote_core::errors::ApplicationError;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INPUT: u8 = 3;
pub const EXIT_INCOMPLETE: u8 = 4;
pub const EXIT_PRICING: u8 = 5;
pub const EXIT_HANDOFF: u8 = 6;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

#[derive(Debug, Serialize)]
struct CommandReport<'a, T> {
    command: &'a str,
    status: &'a str,
    summary: &'a str,
    data: &'a T,
}

impl CommandResult {
    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Failure payload classed by the application error taxonomy.
    pub fn from_error(command: &str, error: impl Into<ApplicationError>, exit_code: u8) -> Self {
        let error = error.into();
        Self::failure(command, error.class(), error.to_string(), exit_code)
    }

    /// A human summary line followed by the JSON payload on the last line.
    pub fn report<T: Serialize>(
        command: &str,
        status: &str,
        summary: &str,
        data: &T,
        exit_code: u8,
    ) -> Self {
        let machine = serde_json::to_string(&CommandReport { command, status, summary, data })
            .unwrap_or_else(|error| {
                serialize_payload(CommandOutcome {
                    command: command.to_string(),
                    status: "error".to_string(),
                    error_class: Some("serialization".to_string()),
                    message: error.to_string(),
                })
            });
        Self { exit_code, output: format!("{summary}\n{machine}") }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\
             \"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(
    command: &str,
    options: &LoadOptions,
) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options.clone())
        .map_err(|error| CommandResult::from_error(command, error, EXIT_CONFIG))
}

pub(crate) fn load_catalog(
    command: &str,
    config: &AppConfig,
) -> Result<PricingCatalog, CommandResult> {
    config.load_catalog().map_err(|error| CommandResult::from_error(command, error, EXIT_CONFIG))
}

/// Answers are a `QuoteFormData` document; `.json` files are JSON, anything else TOML.
pub(crate) fn read_answers(path: &Path) -> anyhow::Result<QuoteFormData> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read answers file `{}`", path.display()))?;
    let is_json = path.extension().is_some_and(|extension| extension == "json");
    let answers = if is_json {
        serde_json::from_str(&raw)
            .with_context(|| format!("could not parse answers file `{}`", path.display()))?
    } else {
        toml::from_str(&raw)
            .with_context(|| format!("could not parse answers file `{}`", path.display()))?
    };
    Ok(answers)
}

pub(crate) fn answers_or_failure(
    command: &str,
    path: &Path,
) -> Result<QuoteFormData, CommandResult> {
    read_answers(path).map_err(|error| {
        CommandResult::failure(command, "invalid_answers", format!("{error:#}"), EXIT_INPUT)
    })
}
