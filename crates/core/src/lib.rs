pub mod artifacts;
pub mod config;
pub mod cpq;
pub mod domain;
pub mod errors;
pub mod flows;

pub use artifacts::{
    compose_quote_message, DocumentRenderer, FileSink, MailComposer, MailDraft, QuoteDocument,
    QuoteDocumentGenerator, QuoteStamp, QuoteSummary, StudioProfile,
};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use cpq::catalog::{builtin_catalog, CatalogError, PricingCatalog};
pub use cpq::pricing::{DeterministicPricingEngine, PricingDetails, PricingEngine, PricingError};
pub use cpq::{CpqEvaluation, CpqRuntime, DeterministicCpqRuntime};
pub use domain::{FieldEdit, FormField, PriceRange, QuoteFormData, ServiceType, WizardStep};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{DocumentOutcome, Notice, QuoteWizard, SubmitOutcome, WizardView};
