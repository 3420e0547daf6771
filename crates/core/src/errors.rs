use thiserror::Error;

use crate::artifacts::HandoffError;
use crate::config::ConfigError;
use crate::cpq::catalog::CatalogError;
use crate::{cpq::pricing::PricingError, flows::WizardTransitionError};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    WizardTransition(#[from] WizardTransitionError),
    /// The selection passed validation but has no price. Option lists come
    /// from the same catalog, so this means the two disagree.
    #[error("cannot compute quote: {0}")]
    Pricing(#[from] PricingError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("catalog failure: {0}")]
    Catalog(String),
    #[error("handoff failure: {0}")]
    Handoff(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Stable machine-readable class for CLI payloads and logs.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::WizardTransition(_)) => "wizard",
            Self::Domain(DomainError::Pricing(_)) => "pricing",
            Self::Catalog(_) => "catalog",
            Self::Handoff(_) => "handoff",
            Self::Configuration(_) => "config_validation",
        }
    }
}

impl From<CatalogError> for ApplicationError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value.to_string())
    }
}

impl From<HandoffError> for ApplicationError {
    fn from(value: HandoffError) -> Self {
        Self::Handoff(value.to_string())
    }
}

impl From<ConfigError> for ApplicationError {
    fn from(value: ConfigError) -> Self {
        Self::Configuration(value.to_string())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The quote request could not be processed. Check the form and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "We could not prepare your quote right now. Please try again."
            }
            Self::Internal { .. } => "We cannot compute a quote for this selection.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(DomainError::WizardTransition(error)) => Self::BadRequest {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Domain(DomainError::Pricing(error)) => {
                Self::Internal {
                    message: error.to_string(),
                    correlation_id: "unassigned".to_owned(),
                }
            }
            ApplicationError::Catalog(message)
            | ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Handoff(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::artifacts::HandoffError;
    use crate::config::ConfigError;
    use crate::cpq::catalog::CatalogError;
    use crate::cpq::pricing::PricingError;
    use crate::domain::{FormField, ServiceType, WizardStep};
    use crate::errors::{ApplicationError, DomainError, InterfaceError};
    use crate::flows::WizardTransitionError;

    #[test]
    fn rejected_transition_maps_to_bad_request() {
        let interface = ApplicationError::from(DomainError::from(
            WizardTransitionError::MissingRequiredFields {
                step: WizardStep::Details,
                missing_fields: vec![FormField::Location],
            },
        ))
        .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(
            interface.user_message(),
            "The quote request could not be processed. Check the form and try again."
        );
    }

    #[test]
    fn catalog_miss_maps_to_internal() {
        let interface = ApplicationError::from(DomainError::from(PricingError::CatalogMiss {
            service_type: ServiceType::Photography,
            subtype: "Event Photography".to_owned(),
            package: "Per Fortnight".to_owned(),
        }))
        .into_interface("req-2");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "We cannot compute a quote for this selection.");
        assert_eq!(interface.correlation_id(), "req-2");
    }

    #[test]
    fn handoff_error_maps_to_service_unavailable() {
        let render = HandoffError::Render("wkhtmltopdf exited with 1".into());
        let error = ApplicationError::from(render);
        assert_eq!(error.class(), "handoff");

        let interface = error.into_interface("req-3");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(
            interface.user_message(),
            "We could not prepare your quote right now. Please try again."
        );
    }

    #[test]
    fn startup_failures_keep_their_class_and_stay_internal() {
        let catalog = ApplicationError::from(CatalogError::Validation("no subtypes".into()));
        assert_eq!(catalog.class(), "catalog");
        assert_eq!(
            catalog.to_string(),
            "catalog failure: catalog validation failed: no subtypes"
        );

        let config = ApplicationError::from(ConfigError::Validation("port must be > 0".into()));
        assert_eq!(config.class(), "config_validation");
        assert!(matches!(config.into_interface("req-4"), InterfaceError::Internal { .. }));
    }
}
