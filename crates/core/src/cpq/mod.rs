pub mod catalog;
pub mod pricing;
pub mod validation;

use serde::{Deserialize, Serialize};

use crate::domain::{FormField, QuoteFormData, WizardStep};

use self::{
    catalog::PricingCatalog,
    pricing::{DeterministicPricingEngine, PricingDetails, PricingEngine, PricingError},
    validation::{max_accessible_step, validate_step},
};

/// Validation and pricing for a complete set of answers, outside the wizard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpqEvaluation {
    pub max_accessible_step: WizardStep,
    pub missing_fields: Vec<FormField>,
    /// Present once the first three steps pass. Contact details do not affect price.
    pub pricing: Option<PricingDetails>,
}

impl CpqEvaluation {
    pub fn is_complete(&self) -> bool {
        self.missing_fields.is_empty() && self.pricing.is_some()
    }
}

pub trait CpqRuntime: Send + Sync {
    fn evaluate_quote(
        &self,
        form: &QuoteFormData,
        catalog: &PricingCatalog,
    ) -> Result<CpqEvaluation, PricingError>;
}

pub struct DeterministicCpqRuntime<P = DeterministicPricingEngine> {
    pricing_engine: P,
}

impl<P> DeterministicCpqRuntime<P> {
    pub fn new(pricing_engine: P) -> Self {
        Self { pricing_engine }
    }
}

impl Default for DeterministicCpqRuntime {
    fn default() -> Self {
        Self::new(DeterministicPricingEngine)
    }
}

impl<P> CpqRuntime for DeterministicCpqRuntime<P>
where
    P: PricingEngine,
{
    fn evaluate_quote(
        &self,
        form: &QuoteFormData,
        catalog: &PricingCatalog,
    ) -> Result<CpqEvaluation, PricingError> {
        let missing_fields: Vec<FormField> =
            WizardStep::ALL.into_iter().flat_map(|step| validate_step(form, step)).collect();
        let reachable = max_accessible_step(form);

        let pricing = if reachable == WizardStep::Contact {
            Some(self.pricing_engine.price(form, catalog)?)
        } else {
            None
        };

        Ok(CpqEvaluation { max_accessible_step: reachable, missing_fields, pricing })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        artifacts::fixtures::cinematic_rush_form,
        cpq::{
            catalog::{builtin_catalog, PricingCatalog},
            pricing::{PricingDetails, PricingEngine, PricingError},
            CpqRuntime, DeterministicCpqRuntime,
        },
        domain::{FormField, PriceRange, QuoteFormData, WizardStep},
    };

    #[test]
    fn complete_answers_are_priced() {
        let runtime = DeterministicCpqRuntime::default();

        let evaluation =
            runtime.evaluate_quote(&cinematic_rush_form(), builtin_catalog()).expect("evaluate");

        assert!(evaluation.is_complete());
        assert_eq!(evaluation.max_accessible_step, WizardStep::Contact);
        let pricing = evaluation.pricing.expect("pricing");
        assert_eq!(pricing.total, PriceRange::whole(3250, 6250));
    }

    #[test]
    fn missing_contact_details_still_price_but_are_incomplete() {
        let form = QuoteFormData {
            client_email: Some("not-an-email".to_string()),
            client_phone: None,
            ..cinematic_rush_form()
        };

        let evaluation = DeterministicCpqRuntime::default()
            .evaluate_quote(&form, builtin_catalog())
            .expect("evaluate");

        assert!(!evaluation.is_complete());
        assert!(evaluation.pricing.is_some());
        assert_eq!(evaluation.missing_fields, vec![FormField::ClientEmail, FormField::ClientPhone]);
    }

    #[test]
    fn unreachable_pricing_steps_skip_the_engine() {
        struct PanickingEngine;

        impl PricingEngine for PanickingEngine {
            fn price(
                &self,
                _form: &QuoteFormData,
                _catalog: &PricingCatalog,
            ) -> Result<PricingDetails, PricingError> {
                panic!("engine must not run before step 3 is reachable");
            }
        }

        let form = QuoteFormData { location: None, ..cinematic_rush_form() };
        let evaluation = DeterministicCpqRuntime::new(PanickingEngine)
            .evaluate_quote(&form, builtin_catalog())
            .expect("evaluate");

        assert_eq!(evaluation.max_accessible_step, WizardStep::Details);
        assert_eq!(evaluation.missing_fields, vec![FormField::Location]);
        assert!(evaluation.pricing.is_none());
    }
}
