pub mod engine;
pub mod states;

pub use engine::{QuoteWizard, WizardTransitionError};
pub use states::{
    AddonOption, Direction, DocumentOutcome, Notice, StepIndicator, StepTransition,
    SubmitOutcome, WizardOptions, WizardState, WizardView,
};
