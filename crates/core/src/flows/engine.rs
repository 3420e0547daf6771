use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::artifacts::{
    compose_quote_message, DocumentRenderer, FileSink, MailComposer, QuoteDocumentGenerator,
    QuoteStamp, QuoteSummary, StudioProfile,
};
use crate::cpq::catalog::PricingCatalog;
use crate::cpq::pricing::{DeterministicPricingEngine, PricingDetails, PricingEngine};
use crate::cpq::validation::validate_step;
use crate::domain::form::{clamp_additional_hours, ADDITIONAL_HOURS_ADDON};
use crate::domain::{FieldEdit, FormField, QuoteFormData, WizardStep};
use crate::errors::DomainError;
use crate::flows::states::{
    AddonOption, Direction, DocumentOutcome, Notice, StepIndicator, StepTransition,
    SubmitOutcome, WizardOptions, WizardState, WizardView,
};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WizardTransitionError {
    #[error("step {step} is missing required fields: {missing_fields:?}")]
    MissingRequiredFields { step: WizardStep, missing_fields: Vec<FormField> },
    #[error("step {requested} is locked; furthest accessible step is {max_accessible}")]
    StepLocked { requested: WizardStep, max_accessible: WizardStep },
    #[error("step {step} is the last step; use submit")]
    NoNextStep { step: WizardStep },
    #[error("already on the first step")]
    NoPreviousStep,
    #[error("quotes can only be submitted from the contact step, not step {step}")]
    SubmitOutsideContactStep { step: WizardStep },
}

/// Four-step quote wizard over a borrowed catalog.
///
/// Owns the form, the error set and the last computed result. Every change
/// goes through one of the transition methods below; the furthest accessible
/// step is derived from the form on demand.
pub struct QuoteWizard<'c, P = DeterministicPricingEngine> {
    catalog: &'c PricingCatalog,
    engine: P,
    state: WizardState,
    direction: Direction,
}

impl<'c> QuoteWizard<'c> {
    pub fn new(catalog: &'c PricingCatalog) -> Self {
        Self::with_engine(catalog, DeterministicPricingEngine)
    }
}

impl<'c, P> QuoteWizard<'c, P>
where
    P: PricingEngine,
{
    pub fn with_engine(catalog: &'c PricingCatalog, engine: P) -> Self {
        Self { catalog, engine, state: WizardState::default(), direction: Direction::Forward }
    }

    pub fn catalog(&self) -> &'c PricingCatalog {
        self.catalog
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn current_step(&self) -> WizardStep {
        self.state.current_step
    }

    pub fn form(&self) -> &QuoteFormData {
        &self.state.form
    }

    pub fn error_fields(&self) -> &BTreeSet<FormField> {
        &self.state.error_fields
    }

    pub fn result(&self) -> Option<&PricingDetails> {
        self.state.result.as_ref()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn max_accessible_step(&self) -> WizardStep {
        self.state.max_accessible_step()
    }

    /// Applies one field change. A new service type clears subtype and
    /// duration; a new subtype clears duration. Both wipe the error set.
    pub fn edit(&mut self, edit: FieldEdit) {
        let field = edit.field();
        let changed = self.assign(edit);
        let form = &mut self.state.form;

        match field {
            FormField::ServiceType if changed => {
                form.service_subtype = None;
                form.duration = None;
                self.state.error_fields.clear();
            }
            FormField::ServiceSubtype if changed => {
                form.duration = None;
                self.state.error_fields.clear();
            }
            _ => {
                self.state.error_fields.remove(&field);
            }
        }
    }

    /// Selects or deselects an add-on by name. Returns whether the set changed.
    pub fn toggle_addon(&mut self, name: &str, selected: bool) -> bool {
        let addons = &mut self.state.form.selected_addons;
        let changed =
            if selected { addons.insert(name.to_string()) } else { addons.remove(name) };
        self.state.error_fields.remove(&FormField::SelectedAddons);
        changed
    }

    pub fn next(&mut self) -> Result<StepTransition, WizardTransitionError> {
        let from = self.state.current_step;
        let to = from.next().ok_or(WizardTransitionError::NoNextStep { step: from })?;

        let missing = validate_step(&self.state.form, from);
        if !missing.is_empty() {
            info!(
                event_name = "wizard.step.rejected",
                step = from.number(),
                missing = ?missing,
                "step validation failed"
            );
            self.state.error_fields = missing.clone();
            return Err(WizardTransitionError::MissingRequiredFields {
                step: from,
                missing_fields: missing.into_iter().collect(),
            });
        }

        self.state.error_fields.clear();
        Ok(self.move_to(from, to))
    }

    pub fn previous(&mut self) -> Result<StepTransition, WizardTransitionError> {
        let from = self.state.current_step;
        let to = from.previous().ok_or(WizardTransitionError::NoPreviousStep)?;
        self.state.error_fields.clear();
        Ok(self.move_to(from, to))
    }

    /// Step-indicator navigation. Discards any computed result.
    pub fn go_to_step(
        &mut self,
        step: WizardStep,
    ) -> Result<StepTransition, WizardTransitionError> {
        let max_accessible = self.max_accessible_step();
        if step > max_accessible {
            return Err(WizardTransitionError::StepLocked { requested: step, max_accessible });
        }

        let from = self.state.current_step;
        self.state.error_fields.clear();
        self.state.result = None;
        Ok(self.move_to(from, step))
    }

    /// Prices the completed form, stores the result and hands the message to
    /// `composer`. A failed handoff leaves the stored result in place.
    pub fn submit(
        &mut self,
        studio: &StudioProfile,
        stamp: &QuoteStamp,
        composer: &dyn MailComposer,
    ) -> Result<SubmitOutcome, DomainError> {
        let step = self.state.current_step;
        if step != WizardStep::Contact {
            return Err(WizardTransitionError::SubmitOutsideContactStep { step }.into());
        }

        let missing = validate_step(&self.state.form, step);
        if !missing.is_empty() {
            self.state.error_fields = missing.clone();
            return Ok(SubmitOutcome::Incomplete {
                missing_fields: missing.into_iter().collect(),
                notice: Notice::CompleteRequiredFields,
            });
        }

        let pricing = match self.engine.price(&self.state.form, self.catalog) {
            Ok(pricing) => pricing,
            Err(pricing_error) => {
                // Option lists come from the catalog, so this is a data bug.
                error!(
                    event_name = "wizard.submit.catalog_miss",
                    error = %pricing_error,
                    "validated selection has no catalog price"
                );
                self.state.result = None;
                return Err(pricing_error.into());
            }
        };
        info!(
            event_name = "wizard.submit.priced",
            reference = %stamp.reference,
            total = %pricing.total,
            "quote priced"
        );
        self.state.error_fields.clear();
        self.state.result = Some(pricing.clone());

        let draft = compose_quote_message(&QuoteSummary {
            form: &self.state.form,
            pricing: &pricing,
            stamp,
            studio,
        });
        let notice = match composer.compose(&draft) {
            Ok(()) => Notice::MailPrepared,
            Err(handoff_error) => {
                warn!(
                    event_name = "wizard.submit.mail_unavailable",
                    error = %handoff_error,
                    "mail handoff failed"
                );
                Notice::MailUnavailable
            }
        };

        Ok(SubmitOutcome::Submitted { pricing, draft, notice })
    }

    /// Renders the stored result into a document and saves it. Never prices.
    pub fn download_document(
        &self,
        studio: &StudioProfile,
        stamp: &QuoteStamp,
        generator: &QuoteDocumentGenerator,
        renderer: &dyn DocumentRenderer,
        sink: &dyn FileSink,
    ) -> DocumentOutcome {
        let Some(pricing) = self.state.result.as_ref() else {
            return DocumentOutcome::NotReady { notice: Notice::QuoteNotReady };
        };

        let summary = QuoteSummary { form: &self.state.form, pricing, stamp, studio };
        let saved = generator.generate(&summary, renderer).and_then(|document| {
            let location = sink.save(&document.filename, &document.bytes)?;
            Ok((document, location))
        });

        match saved {
            Ok((document, location)) => {
                info!(
                    event_name = "artifact.document.saved",
                    filename = %document.filename,
                    location = %location,
                    "quote document saved"
                );
                DocumentOutcome::Saved {
                    filename: document.filename,
                    location,
                    content_type: document.content_type.to_string(),
                    notice: Notice::DocumentSaved,
                }
            }
            Err(handoff_error) => {
                warn!(
                    event_name = "artifact.document.failed",
                    error = %handoff_error,
                    "document handoff failed"
                );
                DocumentOutcome::Failed { notice: Notice::DocumentUnavailable }
            }
        }
    }

    /// Walks the wizard through `answers` the way a client would: fill each
    /// step, press Next, up to the contact step. Stops at the first step
    /// that fails, with its error fields set.
    pub fn replay(&mut self, answers: &QuoteFormData) -> Result<WizardStep, WizardTransitionError> {
        for step in WizardStep::ALL {
            if self.state.current_step != step {
                self.go_to_step(step)?;
            }
            for edit in step_edits(answers, step) {
                self.edit(edit);
            }
            if step == WizardStep::Preferences {
                for addon in &answers.selected_addons {
                    self.toggle_addon(addon, true);
                }
            }
            if step != WizardStep::Contact {
                self.next()?;
            }
        }
        Ok(self.state.current_step)
    }

    pub fn view(&self) -> WizardView {
        let current = self.state.current_step;
        let max_accessible = self.max_accessible_step();
        let steps = WizardStep::ALL
            .into_iter()
            .map(|step| StepIndicator {
                step,
                label: step.label(),
                active: step == current,
                completed: step < current,
                accessible: step <= max_accessible,
            })
            .collect();

        WizardView {
            current_step: current,
            max_accessible_step: max_accessible,
            direction: self.direction,
            steps,
            error_fields: self.state.error_fields.iter().copied().collect(),
            options: self.options(),
            show_additional_hours: self
                .state
                .form
                .selected_addons
                .contains(ADDITIONAL_HOURS_ADDON),
            result: self.state.result.clone(),
            form: self.state.form.clone(),
        }
    }

    fn options(&self) -> WizardOptions {
        let form = &self.state.form;
        let mut options =
            WizardOptions { service_types: self.catalog.service_types(), ..Default::default() };
        let Some(service_type) = form.service_type else {
            return options;
        };

        options.subtypes = self
            .catalog
            .subtypes(service_type)
            .unwrap_or_default()
            .into_iter()
            .map(str::to_string)
            .collect();
        if let Some(subtype) = form.text(FormField::ServiceSubtype) {
            options.packages = self
                .catalog
                .subtype(service_type, subtype)
                .map(|entry| entry.packages.clone())
                .unwrap_or_default();
        }
        options.addons = self
            .catalog
            .addons(service_type)
            .unwrap_or_default()
            .iter()
            .map(|addon| AddonOption {
                option: addon.clone(),
                selected: form.selected_addons.contains(&addon.name),
            })
            .collect();
        options
    }

    fn move_to(&mut self, from: WizardStep, to: WizardStep) -> StepTransition {
        if to > from {
            self.direction = Direction::Forward;
        } else if to < from {
            self.direction = Direction::Backward;
        }
        self.state.current_step = to;
        info!(
            event_name = "wizard.step.advanced",
            from = from.number(),
            to = to.number(),
            direction = ?self.direction,
            "wizard step changed"
        );
        StepTransition { from, to, direction: self.direction }
    }

    /// Writes the edited value and reports whether it differed.
    fn assign(&mut self, edit: FieldEdit) -> bool {
        let form = &mut self.state.form;
        match edit {
            FieldEdit::ServiceType(value) => replace(&mut form.service_type, value),
            FieldEdit::ServiceSubtype(value) => replace(&mut form.service_subtype, value),
            FieldEdit::Duration(value) => replace(&mut form.duration, value),
            FieldEdit::EventDate(value) => replace(&mut form.event_date, value),
            FieldEdit::Location(value) => replace(&mut form.location, value),
            FieldEdit::Venue(value) => replace(&mut form.venue, value),
            FieldEdit::DeliveryTime(value) => replace(&mut form.delivery_time, value),
            FieldEdit::Budget(value) => replace(&mut form.budget, value),
            FieldEdit::Style(value) => replace(&mut form.style, value),
            FieldEdit::AdditionalHoursCount(count) => {
                replace(&mut form.additional_hours_count, clamp_additional_hours(count))
            }
            FieldEdit::ClientName(value) => replace(&mut form.client_name, value),
            FieldEdit::ClientEmail(value) => replace(&mut form.client_email, value),
            FieldEdit::ClientPhone(value) => replace(&mut form.client_phone, value),
            FieldEdit::Company(value) => replace(&mut form.company, value),
            FieldEdit::AdditionalNotes(value) => replace(&mut form.additional_notes, value),
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

/// The edits a client would make on `step` to reproduce `answers`.
fn step_edits(answers: &QuoteFormData, step: WizardStep) -> Vec<FieldEdit> {
    let text = |value: &Option<String>| value.clone().map(Some);
    let edits = match step {
        WizardStep::Service => vec![
            answers.service_type.map(|value| FieldEdit::ServiceType(Some(value))),
            text(&answers.service_subtype).map(FieldEdit::ServiceSubtype),
            text(&answers.duration).map(FieldEdit::Duration),
        ],
        WizardStep::Details => vec![
            answers.event_date.map(|value| FieldEdit::EventDate(Some(value))),
            answers.location.map(|value| FieldEdit::Location(Some(value))),
            answers.venue.map(|value| FieldEdit::Venue(Some(value))),
        ],
        WizardStep::Preferences => vec![
            answers.delivery_time.map(|value| FieldEdit::DeliveryTime(Some(value))),
            answers.budget.map(|value| FieldEdit::Budget(Some(value))),
            answers.style.map(|value| FieldEdit::Style(Some(value))),
            Some(FieldEdit::AdditionalHoursCount(answers.additional_hours_count)),
        ],
        WizardStep::Contact => vec![
            text(&answers.client_name).map(FieldEdit::ClientName),
            text(&answers.client_email).map(FieldEdit::ClientEmail),
            text(&answers.client_phone).map(FieldEdit::ClientPhone),
            text(&answers.company).map(FieldEdit::Company),
            text(&answers.additional_notes).map(FieldEdit::AdditionalNotes),
        ],
    };
    edits.into_iter().flatten().collect()
}
