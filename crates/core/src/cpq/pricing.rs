use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpq::catalog::PricingCatalog;
use crate::domain::form::ADDITIONAL_HOURS_ADDON;
use crate::domain::{FormField, PriceRange, QuoteFormData, ServiceType};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonLine {
    pub name: String,
    pub quantity: u32,
    pub price: PriceRange,
}

/// Computed estimate. `base` is already style-adjusted; `rush` is the
/// surcharge on top of it and is absent for standard delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingDetails {
    pub base: PriceRange,
    pub addons: PriceRange,
    pub rush: Option<PriceRange>,
    pub total: PriceRange,
    pub addon_lines: Vec<AddonLine>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: PriceRange,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub details: PricingDetails,
    pub trace: Vec<PricingTraceStep>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("cannot price quote without `{0}`")]
    MissingSelection(FormField),
    #[error("no catalog price for {service_type} / `{subtype}` / `{package}`")]
    CatalogMiss { service_type: ServiceType, subtype: String, package: String },
    #[error("price overflow while computing the {stage} amount")]
    Overflow { stage: &'static str },
}

pub trait PricingEngine: Send + Sync {
    fn price(
        &self,
        form: &QuoteFormData,
        catalog: &PricingCatalog,
    ) -> Result<PricingDetails, PricingError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicPricingEngine;

impl PricingEngine for DeterministicPricingEngine {
    fn price(
        &self,
        form: &QuoteFormData,
        catalog: &PricingCatalog,
    ) -> Result<PricingDetails, PricingError> {
        price_quote(form, catalog)
    }
}

pub fn price_quote(
    form: &QuoteFormData,
    catalog: &PricingCatalog,
) -> Result<PricingDetails, PricingError> {
    price_with_trace(form, catalog).map(|result| result.details)
}

pub fn price_with_trace(
    form: &QuoteFormData,
    catalog: &PricingCatalog,
) -> Result<PricingResult, PricingError> {
    let service_type =
        form.service_type.ok_or(PricingError::MissingSelection(FormField::ServiceType))?;
    let subtype = form
        .text(FormField::ServiceSubtype)
        .ok_or(PricingError::MissingSelection(FormField::ServiceSubtype))?;
    let package =
        form.text(FormField::Duration).ok_or(PricingError::MissingSelection(FormField::Duration))?;

    let catalog_base = catalog.base_price(service_type, subtype, package).ok_or_else(|| {
        PricingError::CatalogMiss {
            service_type,
            subtype: subtype.to_string(),
            package: package.to_string(),
        }
    })?;
    let mut trace = vec![PricingTraceStep {
        stage: "base".to_string(),
        detail: format!("{service_type} / {subtype} / {package}"),
        amount: catalog_base,
    }];

    let style_multiplier = form.style.map(|style| style.multiplier()).unwrap_or(Decimal::ONE);
    let base = catalog_base
        .checked_scale(style_multiplier)
        .ok_or(PricingError::Overflow { stage: "style" })?;
    trace.push(PricingTraceStep {
        stage: "style".to_string(),
        detail: format!(
            "{} x{style_multiplier}",
            form.style.map(|style| style.as_str()).unwrap_or("none")
        ),
        amount: base,
    });

    let hours = form.effective_additional_hours();
    let addon_lines = catalog
        .addons(service_type)
        .unwrap_or_default()
        .iter()
        .filter(|addon| form.selected_addons.contains(&addon.name))
        .map(|addon| {
            let quantity = if addon.name == ADDITIONAL_HOURS_ADDON { hours } else { 1 };
            let price = addon
                .price
                .checked_scale(Decimal::from(quantity))
                .ok_or(PricingError::Overflow { stage: "addons" })?;
            Ok(AddonLine { name: addon.name.clone(), quantity, price })
        })
        .collect::<Result<Vec<_>, PricingError>>()?;
    let addons = addon_lines
        .iter()
        .try_fold(PriceRange::ZERO, |total, line| total.checked_add(line.price))
        .ok_or(PricingError::Overflow { stage: "addons" })?;
    trace.push(PricingTraceStep {
        stage: "addons".to_string(),
        detail: format!("{} priced add-on(s)", addon_lines.len()),
        amount: addons,
    });

    let delivery = form.delivery_time_or_default();
    let rush_multiplier = delivery.multiplier();
    let rush = if rush_multiplier > Decimal::ONE {
        let surcharge = base
            .checked_scale(rush_multiplier - Decimal::ONE)
            .ok_or(PricingError::Overflow { stage: "rush" })?;
        Some(surcharge)
    } else {
        None
    };
    if let Some(surcharge) = rush {
        trace.push(PricingTraceStep {
            stage: "rush".to_string(),
            detail: format!("{delivery} x{rush_multiplier}"),
            amount: surcharge,
        });
    }

    let total = base
        .checked_scale(rush_multiplier)
        .and_then(|rushed| rushed.checked_add(addons))
        .ok_or(PricingError::Overflow { stage: "total" })?;
    trace.push(PricingTraceStep {
        stage: "total".to_string(),
        detail: "base x rush + addons".to_string(),
        amount: total,
    });

    Ok(PricingResult { details: PricingDetails { base, addons, rush, total, addon_lines }, trace })
}
