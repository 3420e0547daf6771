use serde::Serialize;
use wrh_quote_core::config::LoadOptions;
use wrh_quote_core::cpq::catalog::{PricedOption, PricingCatalog};
use wrh_quote_core::domain::ServiceType;

use crate::commands::{load_catalog, load_config, CommandResult, EXIT_INPUT};

#[derive(Debug, Serialize)]
struct ServiceListing<'a> {
    service_type: ServiceType,
    label: &'static str,
    subtypes: Vec<SubtypeListing<'a>>,
    addons: &'a [PricedOption],
}

#[derive(Debug, Serialize)]
struct SubtypeListing<'a> {
    name: &'a str,
    packages: &'a [PricedOption],
}

pub fn run(options: &LoadOptions, service: Option<&str>) -> CommandResult {
    let config = match load_config("catalog", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let catalog = match load_catalog("catalog", &config) {
        Ok(catalog) => catalog,
        Err(failure) => return failure,
    };

    let listings = match service {
        None => listings(&catalog, &catalog.service_types()),
        Some(raw) => {
            let service_type = match raw.parse::<ServiceType>() {
                Ok(service_type) => service_type,
                Err(error) => {
                    return CommandResult::failure(
                        "catalog",
                        "unknown_service",
                        error.to_string(),
                        EXIT_INPUT,
                    )
                }
            };
            if catalog.service(service_type).is_none() {
                return CommandResult::failure(
                    "catalog",
                    "unknown_service",
                    format!("the loaded catalog has no prices for `{service_type}`"),
                    EXIT_INPUT,
                );
            }
            listings(&catalog, &[service_type])
        }
    };

    let subtype_count: usize = listings.iter().map(|listing| listing.subtypes.len()).sum();
    let summary = format!(
        "catalog: {} service type(s), {subtype_count} subtype(s), prices in {}",
        listings.len(),
        config.studio.currency
    );
    CommandResult::report("catalog", "ok", &summary, &listings, 0)
}

fn listings<'a>(
    catalog: &'a PricingCatalog,
    service_types: &[ServiceType],
) -> Vec<ServiceListing<'a>> {
    service_types
        .iter()
        .filter_map(|service_type| catalog.service(*service_type))
        .map(|service| ServiceListing {
            service_type: service.service_type,
            label: service.service_type.label(),
            subtypes: service
                .subtypes
                .iter()
                .map(|subtype| SubtypeListing { name: &subtype.name, packages: &subtype.packages })
                .collect(),
            addons: &service.addons,
        })
        .collect()
}
