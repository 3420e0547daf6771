use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::artifacts::MailDraft;
use crate::cpq::catalog::PricedOption;
use crate::cpq::pricing::PricingDetails;
use crate::cpq::validation::max_accessible_step;
use crate::domain::{FormField, QuoteFormData, ServiceType, WizardStep};

/// Which way the last step change went. Only selects a visual transition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTransition {
    pub from: WizardStep,
    pub to: WizardStep,
    pub direction: Direction,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    pub current_step: WizardStep,
    pub form: QuoteFormData,
    pub error_fields: BTreeSet<FormField>,
    pub result: Option<PricingDetails>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            current_step: WizardStep::Service,
            form: QuoteFormData::default(),
            error_fields: BTreeSet::new(),
            result: None,
        }
    }
}

impl WizardState {
    /// Always derived from the current form, never stored.
    pub fn max_accessible_step(&self) -> WizardStep {
        max_accessible_step(&self.form)
    }
}

/// Transient, user-facing feedback after an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Notice {
    CompleteRequiredFields,
    MailPrepared,
    MailUnavailable,
    QuoteNotReady,
    DocumentSaved,
    DocumentUnavailable,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::CompleteRequiredFields => {
                "Please fill in all required fields in the final step."
            }
            Notice::MailPrepared => {
                "Your quote details are being prepared for sending. Please check your email client."
            }
            Notice::MailUnavailable => {
                "We could not prepare your email. Please try again or contact us directly."
            }
            Notice::QuoteNotReady => "Please calculate your quote first.",
            Notice::DocumentSaved => "Your quote document is ready.",
            Notice::DocumentUnavailable => "We could not prepare your document. Please try again.",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SubmitOutcome {
    Incomplete { missing_fields: Vec<FormField>, notice: Notice },
    Submitted { pricing: PricingDetails, draft: MailDraft, notice: Notice },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DocumentOutcome {
    Saved { filename: String, location: String, content_type: String, notice: Notice },
    NotReady { notice: Notice },
    Failed { notice: Notice },
}

impl DocumentOutcome {
    pub fn notice(&self) -> Notice {
        match self {
            DocumentOutcome::Saved { notice, .. }
            | DocumentOutcome::NotReady { notice }
            | DocumentOutcome::Failed { notice } => *notice,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepIndicator {
    pub step: WizardStep,
    pub label: &'static str,
    pub active: bool,
    pub completed: bool,
    pub accessible: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonOption {
    #[serde(flatten)]
    pub option: PricedOption,
    pub selected: bool,
}

/// Choices offered for the current selection, straight from the catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardOptions {
    pub service_types: Vec<ServiceType>,
    pub subtypes: Vec<String>,
    pub packages: Vec<PricedOption>,
    pub addons: Vec<AddonOption>,
}

/// Everything a presentation layer needs to draw the wizard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView {
    pub current_step: WizardStep,
    pub max_accessible_step: WizardStep,
    pub direction: Direction,
    pub steps: Vec<StepIndicator>,
    pub error_fields: Vec<FormField>,
    pub options: WizardOptions,
    pub show_additional_hours: bool,
    pub result: Option<PricingDetails>,
    pub form: QuoteFormData,
}
