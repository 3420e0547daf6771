use std::path::Path;

use serde::Serialize;
use tracing::info;
use wrh_quote_core::config::LoadOptions;
use wrh_quote_core::cpq::pricing::{price_with_trace, PricingDetails, PricingTraceStep};
use wrh_quote_core::cpq::validation::required_fields;
use wrh_quote_core::cpq::{CpqRuntime, DeterministicCpqRuntime};
use wrh_quote_core::domain::{FormField, WizardStep};
use wrh_quote_core::errors::DomainError;

use crate::commands::{
    answers_or_failure, load_catalog, load_config, CommandResult, EXIT_INCOMPLETE, EXIT_PRICING,
};

#[derive(Debug, Serialize)]
struct EstimateReport {
    currency: String,
    max_accessible_step: WizardStep,
    missing_fields: Vec<FormField>,
    pricing: Option<PricingDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<Vec<PricingTraceStep>>,
}

pub fn run(options: &LoadOptions, answers: &Path, explain: bool) -> CommandResult {
    let config = match load_config("estimate", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let catalog = match load_catalog("estimate", &config) {
        Ok(catalog) => catalog,
        Err(failure) => return failure,
    };
    let form = match answers_or_failure("estimate", answers) {
        Ok(form) => form,
        Err(failure) => return failure,
    };

    let evaluation = match DeterministicCpqRuntime::default().evaluate_quote(&form, &catalog) {
        Ok(evaluation) => evaluation,
        Err(error) => {
            return CommandResult::from_error("estimate", DomainError::from(error), EXIT_PRICING)
        }
    };

    // Contact details never change the price.
    let contact = required_fields(WizardStep::Contact);
    let missing_fields: Vec<FormField> = evaluation
        .missing_fields
        .into_iter()
        .filter(|field| !contact.contains(field))
        .collect();

    let trace = match (&evaluation.pricing, explain) {
        (Some(_), true) => match price_with_trace(&form, &catalog) {
            Ok(result) => Some(result.trace),
            Err(error) => {
                return CommandResult::from_error("estimate", DomainError::from(error), EXIT_PRICING)
            }
        },
        _ => None,
    };

    let (status, summary, exit_code) = match &evaluation.pricing {
        Some(pricing) => {
            info!(
                event_name = "cli.estimate.priced",
                total = %pricing.total,
                "answers priced"
            );
            ("ok", format!("estimate: {} {}", config.studio.currency, pricing.total), 0)
        }
        None => (
            "incomplete",
            format!(
                "estimate: step {} is missing {}",
                evaluation.max_accessible_step,
                join_fields(&missing_fields)
            ),
            EXIT_INCOMPLETE,
        ),
    };

    let report = EstimateReport {
        currency: config.studio.currency,
        max_accessible_step: evaluation.max_accessible_step,
        missing_fields,
        pricing: evaluation.pricing,
        trace,
    };
    CommandResult::report("estimate", status, &summary, &report, exit_code)
}

pub(crate) fn join_fields(fields: &[FormField]) -> String {
    fields.iter().map(|field| field.as_str()).collect::<Vec<_>>().join(", ")
}
