use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};
use wrh_quote_core::artifacts::{
    DirectoryFileSink, MailDraft, OutboxMailComposer, QuoteDocumentGenerator, QuoteStamp,
};
use wrh_quote_core::config::{AppConfig, LoadOptions};
use wrh_quote_core::cpq::pricing::PricingDetails;
use wrh_quote_core::domain::{FormField, WizardStep};
use wrh_quote_core::errors::DomainError;
use wrh_quote_core::flows::{
    DocumentOutcome, Notice, QuoteWizard, SubmitOutcome, WizardTransitionError,
};

use crate::commands::estimate::join_fields;
use crate::commands::{
    answers_or_failure, load_catalog, load_config, CommandResult, EXIT_HANDOFF, EXIT_INCOMPLETE,
    EXIT_PRICING,
};

#[derive(Debug, Serialize)]
struct IncompleteReport {
    step: WizardStep,
    missing_fields: Vec<FormField>,
}

#[derive(Debug, Serialize)]
struct MailReport {
    recipient: String,
    subject: String,
    mailto: String,
    outbox: String,
    notice: Notice,
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct QuoteReport {
    reference: String,
    currency: String,
    pricing: PricingDetails,
    mail: MailReport,
    document: Option<DocumentReport>,
}

#[derive(Debug, Serialize)]
struct DocumentReport {
    outcome: DocumentOutcome,
    message: &'static str,
}

pub fn run(options: &LoadOptions, answers: &Path, with_document: bool) -> CommandResult {
    let config = match load_config("quote", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let catalog = match load_catalog("quote", &config) {
        Ok(catalog) => catalog,
        Err(failure) => return failure,
    };
    let form = match answers_or_failure("quote", answers) {
        Ok(form) => form,
        Err(failure) => return failure,
    };

    let mut wizard = QuoteWizard::new(&catalog);
    match wizard.replay(&form) {
        Ok(_) => {}
        Err(WizardTransitionError::MissingRequiredFields { step, missing_fields }) => {
            return incomplete(step, missing_fields);
        }
        Err(error) => {
            return CommandResult::from_error("quote", DomainError::from(error), EXIT_INCOMPLETE)
        }
    }

    let stamp = QuoteStamp::now(&config.studio.reference_prefix);
    let composer = OutboxMailComposer::new(&config.mail.outbox_dir);
    let (pricing, draft, mail_notice) = match wizard.submit(&config.studio, &stamp, &composer) {
        Ok(SubmitOutcome::Submitted { pricing, draft, notice }) => (pricing, draft, notice),
        Ok(SubmitOutcome::Incomplete { missing_fields, .. }) => {
            return incomplete(WizardStep::Contact, missing_fields);
        }
        Err(error) => return CommandResult::from_error("quote", error, EXIT_PRICING),
    };

    let document = with_document.then(|| {
        let outcome = generate_document(&wizard, &config, &stamp);
        DocumentReport { message: outcome.notice().message(), outcome }
    });

    let mail_ok = mail_notice == Notice::MailPrepared;
    let document_ok = document
        .as_ref()
        .map_or(true, |report| matches!(report.outcome, DocumentOutcome::Saved { .. }));
    let (status, exit_code) = if mail_ok && document_ok {
        ("ok", 0)
    } else {
        warn!(
            event_name = "cli.quote.handoff_failed",
            reference = %stamp.reference,
            mail_ok,
            document_ok,
            "quote priced but a handoff failed"
        );
        ("handoff_failed", EXIT_HANDOFF)
    };
    info!(
        event_name = "cli.quote.completed",
        reference = %stamp.reference,
        total = %pricing.total,
        "quote replayed"
    );

    let summary = format!(
        "quote {}: {} {} for {}",
        stamp.reference,
        config.studio.currency,
        pricing.total,
        form.client_name.as_deref().unwrap_or("client")
    );
    let report = QuoteReport {
        reference: stamp.reference.clone(),
        currency: config.studio.currency.clone(),
        pricing,
        mail: mail_report(&draft, &config, mail_notice),
        document,
    };
    CommandResult::report("quote", status, &summary, &report, exit_code)
}

fn generate_document(
    wizard: &QuoteWizard<'_>,
    config: &AppConfig,
    stamp: &QuoteStamp,
) -> DocumentOutcome {
    let generator = match QuoteDocumentGenerator::new() {
        Ok(generator) => generator,
        Err(error) => {
            warn!(event_name = "cli.quote.template_failed", error = %error, "template unavailable");
            return DocumentOutcome::Failed { notice: Notice::DocumentUnavailable };
        }
    };
    let renderer = config.document.renderer();
    let sink = DirectoryFileSink::new(&config.document.output_dir);
    wizard.download_document(&config.studio, stamp, &generator, renderer.as_ref(), &sink)
}

fn mail_report(draft: &MailDraft, config: &AppConfig, notice: Notice) -> MailReport {
    MailReport {
        recipient: draft.recipient.clone(),
        subject: draft.subject.clone(),
        mailto: draft.mailto_uri(),
        outbox: config
            .mail
            .outbox_dir
            .join(format!("{}.eml", draft.reference))
            .display()
            .to_string(),
        notice,
        message: notice.message(),
    }
}

fn incomplete(step: WizardStep, missing_fields: Vec<FormField>) -> CommandResult {
    let summary = format!("quote: step {step} is missing {}", join_fields(&missing_fields));
    CommandResult::report(
        "quote",
        "incomplete",
        &summary,
        &IncompleteReport { step, missing_fields },
        EXIT_INCOMPLETE,
    )
}
