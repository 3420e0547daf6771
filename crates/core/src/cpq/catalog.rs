use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{PriceRange, ServiceType};

/// Upper bound for any single catalog amount. Keeps every multiplier and
/// add-on sum well inside `Decimal` range.
pub const MAX_OPTION_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// A named price point: a package of a subtype, or an add-on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedOption {
    pub name: String,
    #[serde(flatten)]
    pub price: PriceRange,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtypeCatalog {
    pub name: String,
    pub packages: Vec<PricedOption>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCatalog {
    pub service_type: ServiceType,
    pub subtypes: Vec<SubtypeCatalog>,
    #[serde(default)]
    pub addons: Vec<PricedOption>,
}

/// Static price list: base prices keyed by service type, subtype and
/// package, plus add-on prices keyed by service type. Order is display order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingCatalog {
    services: Vec<ServiceCatalog>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("catalog validation failed: {0}")]
    Validation(String),
}

impl PricingCatalog {
    pub fn new(services: Vec<ServiceCatalog>) -> Result<Self, CatalogError> {
        let catalog = Self { services };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Loads a replacement catalog. The file replaces the built-in data
    /// wholesale; there is no merging.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let catalog: PricingCatalog = toml::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn services(&self) -> &[ServiceCatalog] {
        &self.services
    }

    pub fn service(&self, service_type: ServiceType) -> Option<&ServiceCatalog> {
        self.services.iter().find(|service| service.service_type == service_type)
    }

    pub fn service_types(&self) -> Vec<ServiceType> {
        self.services.iter().map(|service| service.service_type).collect()
    }

    pub fn subtype(&self, service_type: ServiceType, subtype: &str) -> Option<&SubtypeCatalog> {
        self.service(service_type)?.subtypes.iter().find(|entry| entry.name == subtype)
    }

    /// Subtype names offered for a service type, or `None` when the service
    /// type is not priced at all.
    pub fn subtypes(&self, service_type: ServiceType) -> Option<Vec<&str>> {
        self.service(service_type)
            .map(|service| service.subtypes.iter().map(|entry| entry.name.as_str()).collect())
    }

    pub fn packages(&self, service_type: ServiceType, subtype: &str) -> Option<Vec<&str>> {
        self.subtype(service_type, subtype)
            .map(|entry| entry.packages.iter().map(|package| package.name.as_str()).collect())
    }

    pub fn addons(&self, service_type: ServiceType) -> Option<&[PricedOption]> {
        self.service(service_type).map(|service| service.addons.as_slice())
    }

    pub fn base_price(
        &self,
        service_type: ServiceType,
        subtype: &str,
        package: &str,
    ) -> Option<PriceRange> {
        self.subtype(service_type, subtype)?
            .packages
            .iter()
            .find(|entry| entry.name == package)
            .map(|entry| entry.price)
    }

    pub fn addon_price(&self, service_type: ServiceType, addon: &str) -> Option<PriceRange> {
        self.addons(service_type)?.iter().find(|entry| entry.name == addon).map(|entry| entry.price)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut seen_services = HashSet::new();
        for service in &self.services {
            if !seen_services.insert(service.service_type) {
                return Err(CatalogError::Validation(format!(
                    "service type `{}` is listed more than once",
                    service.service_type
                )));
            }
            if service.subtypes.is_empty() {
                return Err(CatalogError::Validation(format!(
                    "service type `{}` has no subtypes",
                    service.service_type
                )));
            }

            let context = service.service_type.as_str();
            ensure_unique_names(context, service.subtypes.iter().map(|entry| entry.name.as_str()))?;
            ensure_unique_names(context, service.addons.iter().map(|entry| entry.name.as_str()))?;
            ensure_bounded_prices(context, &service.addons)?;

            for subtype in &service.subtypes {
                if subtype.packages.is_empty() {
                    return Err(CatalogError::Validation(format!(
                        "subtype `{}` of `{context}` has no packages",
                        subtype.name
                    )));
                }
                let context = format!("{context}/{}", subtype.name);
                ensure_unique_names(
                    &context,
                    subtype.packages.iter().map(|entry| entry.name.as_str()),
                )?;
                ensure_bounded_prices(&context, &subtype.packages)?;
            }
        }
        Ok(())
    }
}

fn ensure_unique_names<'a>(
    context: &str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(CatalogError::Validation(format!("blank option name under `{context}`")));
        }
        if !seen.insert(name) {
            return Err(CatalogError::Validation(format!(
                "duplicate option `{name}` under `{context}`"
            )));
        }
    }
    Ok(())
}

fn ensure_bounded_prices(context: &str, options: &[PricedOption]) -> Result<(), CatalogError> {
    match options.iter().find(|option| option.price.max > MAX_OPTION_PRICE) {
        Some(option) => Err(CatalogError::Validation(format!(
            "price of `{}` under `{context}` exceeds {MAX_OPTION_PRICE}",
            option.name
        ))),
        None => Ok(()),
    }
}

/// Process-wide built-in price list, built on first use.
pub fn builtin_catalog() -> &'static PricingCatalog {
    static BUILTIN: OnceLock<PricingCatalog> = OnceLock::new();
    BUILTIN.get_or_init(builtin_price_list)
}

type PackageRow = (&'static str, u32, u32);

fn priced(rows: &[PackageRow]) -> Vec<PricedOption> {
    rows.iter()
        .map(|(name, min, max)| PricedOption {
            name: (*name).to_string(),
            price: PriceRange::whole(*min, *max),
        })
        .collect()
}

fn service(
    service_type: ServiceType,
    subtypes: &[(&'static str, &[PackageRow])],
    addons: &[PackageRow],
) -> ServiceCatalog {
    ServiceCatalog {
        service_type,
        subtypes: subtypes
            .iter()
            .map(|(name, packages)| SubtypeCatalog {
                name: (*name).to_string(),
                packages: priced(packages),
            })
            .collect(),
        addons: priced(addons),
    }
}

fn builtin_price_list() -> PricingCatalog {
    PricingCatalog {
        services: vec![
            service(
                ServiceType::Photography,
                &[
                    (
                        "Event Photography",
                        &[
                            ("Per Hour", 250, 500),
                            ("Half Day (4 hours)", 1200, 2000),
                            ("Full Day (8 hours)", 2000, 3500),
                        ],
                    ),
                    ("Corporate/Business Headshots", &[("Per Person", 150, 500)]),
                    ("Product Photography", &[("Per Photo", 100, 400)]),
                    ("Food Photography", &[("Per Photo (with styling)", 150, 400)]),
                    (
                        "Real Estate Photography",
                        &[
                            ("Apartment (15-25 photos)", 700, 1500),
                            ("Villa (25+ photos)", 1500, 3000),
                        ],
                    ),
                    ("Fashion/Lifestyle Photography", &[("Half Day Session", 1500, 5000)]),
                    ("Wedding Photography", &[("Complete Package", 5000, 25000)]),
                ],
                &[
                    ("Second Photographer", 500, 1500),
                    ("Photo Booth Setup", 1000, 3000),
                    ("Same Day Preview", 300, 800),
                    ("Additional Hours", 250, 500),
                    ("Travel Outside Dubai", 200, 1000),
                ],
            ),
            service(
                ServiceType::Videography,
                &[
                    (
                        "Event Videography",
                        &[
                            ("Per Hour (1 camera)", 200, 400),
                            ("Half Day (4 hours)", 700, 1500),
                            ("Full Day (8 hours)", 1500, 3000),
                        ],
                    ),
                    ("Corporate Video", &[("Complete Project", 1500, 12500)]),
                    ("Promotional/Brand Video", &[("Complete Project", 5000, 25000)]),
                    ("Real Estate Videography", &[("Cinematic Property Tour", 500, 2000)]),
                    ("Wedding Videography", &[("Complete Package", 3000, 15000)]),
                ],
                &[
                    ("Second Videographer", 800, 2000),
                    ("Live Streaming", 1500, 5000),
                    ("Multi-Camera Setup", 1000, 3000),
                    ("Same Day Highlights", 800, 2000),
                    ("Travel Outside Dubai", 300, 1500),
                ],
            ),
            service(
                ServiceType::VirtualTours,
                &[
                    ("Studio Apartment", &[("360° Tour + 10-15 HD Photos", 750, 1200)]),
                    ("1-Bedroom Apartment", &[("360° Tour + 15-20 HD Photos", 1000, 1500)]),
                    ("2-Bedroom Apartment", &[("360° Tour + 20-25 HD Photos", 1350, 2000)]),
                    ("3-Bedroom Villa", &[("360° Tour + 25-30 HD Photos", 1750, 2800)]),
                    ("Large Villa/Townhouse", &[("360° Tour + 35+ HD Photos", 2500, 5000)]),
                ],
                &[
                    ("Virtual Staging (per room)", 300, 600),
                    ("Floor Plan Creation", 500, 1200),
                    ("Branded Virtual Tour", 800, 1500),
                    ("Social Media Package", 400, 800),
                ],
            ),
            service(
                ServiceType::Timelapse,
                &[
                    ("Short-Term Time-Lapse", &[("Per Day", 1200, 3200)]),
                    ("Construction Time-Lapse", &[("Per Month (per camera)", 3200, 6400)]),
                    ("Hyperlapse (Moving Time-Lapse)", &[("Finished 15-sec Clip", 1500, 4000)]),
                    ("Final Project Video Edit", &[("Complete Project", 2400, 8000)]),
                ],
                &[
                    ("Advanced Color Grading", 400, 1500),
                    ("Motion Graphics Overlay", 500, 2000),
                    ("4K/6K Resolution Export", 300, 800),
                    ("Drone Hyperlapse", 1000, 2500),
                ],
            ),
            service(
                ServiceType::PostProduction,
                &[
                    (
                        "Photo Editing",
                        &[
                            ("Basic Retouching (per photo)", 20, 50),
                            ("Advanced Retouching (per photo)", 50, 250),
                            ("Photo Restoration (per photo)", 100, 300),
                        ],
                    ),
                    (
                        "Video Editing",
                        &[
                            ("Hourly Rate", 150, 500),
                            ("Per Finished Minute", 500, 1500),
                            ("Social Media Edit (15-60s)", 500, 1500),
                            ("Wedding Highlights (3-5 min)", 2000, 5000),
                        ],
                    ),
                ],
                &[
                    ("Color Grading", 200, 800),
                    ("Motion Graphics", 500, 2000),
                    ("Audio Enhancement", 300, 1000),
                    ("Subtitle Creation", 200, 600),
                ],
            ),
        ],
    }
}
