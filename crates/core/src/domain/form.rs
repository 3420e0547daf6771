use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ADDITIONAL_HOURS_ADDON: &str = "Additional Hours";
pub const MIN_ADDITIONAL_HOURS: u32 = 1;
pub const MAX_ADDITIONAL_HOURS: u32 = 12;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FieldParseError {
    #[error("unsupported {field} `{value}` (expected {expected})")]
    UnknownOption { field: &'static str, value: String, expected: String },
    #[error("invalid {field} `{value}`: {reason}")]
    Malformed { field: &'static str, value: String, reason: String },
    #[error("{0} cannot be edited as a single value")]
    NotEditable(FormField),
}

macro_rules! option_vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => ($id:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $id)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $id),+
                }
            }

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl FromStr for $name {
            type Err = FieldParseError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim().to_ascii_lowercase().as_str() {
                    $($id => Ok($name::$variant),)+
                    other => Err(FieldParseError::UnknownOption {
                        field: $field,
                        value: other.to_string(),
                        expected: [$($id),+].join("|"),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

option_vocabulary! {
    /// Top-level service families offered by the studio.
    ServiceType, "service type" {
        Photography => ("photography", "Photography"),
        Videography => ("videography", "Videography"),
        VirtualTours => ("360tours", "360 Virtual Tours"),
        Timelapse => ("timelapse", "Time-Lapse & Hyperlapse"),
        PostProduction => ("postproduction", "Post-Production"),
    }
}

option_vocabulary! {
    Location, "location" {
        Dubai => ("dubai", "Dubai"),
        AbuDhabi => ("abu-dhabi", "Abu Dhabi"),
        Sharjah => ("sharjah", "Sharjah"),
        Other => ("other", "Other"),
    }
}

option_vocabulary! {
    Venue, "venue" {
        Indoor => ("indoor", "Indoor"),
        Outdoor => ("outdoor", "Outdoor"),
        Studio => ("studio", "Studio"),
        Office => ("office", "Office/Corporate"),
        Ballroom => ("ballroom", "Ballroom"),
        Restaurant => ("restaurant", "Restaurant"),
        ExhibitionCenter => ("exhibition-center", "Exhibition Center"),
    }
}

option_vocabulary! {
    DeliveryTime, "delivery time" {
        Standard => ("standard", "Standard (7-14 days)"),
        Rush => ("rush", "Rush (3-7 days)"),
        Express => ("express", "Express (1-3 days)"),
        SameDay => ("same-day", "Same Day"),
    }
}

option_vocabulary! {
    Style, "style" {
        Modern => ("modern", "Modern & Clean"),
        Cinematic => ("cinematic", "Cinematic"),
        Artistic => ("artistic", "Artistic & Creative"),
        Luxury => ("luxury", "Luxury & Elegant"),
    }
}

option_vocabulary! {
    /// Indicative budget band. Informational only, never priced.
    Budget, "budget" {
        Under2000 => ("under-2000", "Under 2,000"),
        From2000To5000 => ("2000-5000", "2,000 - 5,000"),
        From5000To10000 => ("5000-10000", "5,000 - 10,000"),
        From10000To25000 => ("10000-25000", "10,000 - 25,000"),
        From25000To50000 => ("25000-50000", "25,000 - 50,000"),
        Over50000 => ("over-50000", "Over 50,000"),
    }
}

impl DeliveryTime {
    /// Factor applied to the style-adjusted base price.
    pub fn multiplier(&self) -> Decimal {
        match self {
            DeliveryTime::Standard => Decimal::ONE,
            DeliveryTime::Rush => Decimal::new(125, 2),
            DeliveryTime::Express => Decimal::new(15, 1),
            DeliveryTime::SameDay => Decimal::new(2, 0),
        }
    }
}

impl Style {
    pub fn multiplier(&self) -> Decimal {
        match self {
            Style::Cinematic | Style::Artistic | Style::Luxury => Decimal::new(15, 1),
            Style::Modern => Decimal::ONE,
        }
    }
}

/// Identifiers for every wizard field, as the presentation layer names them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    ServiceType,
    ServiceSubtype,
    Duration,
    EventDate,
    Location,
    Venue,
    DeliveryTime,
    Budget,
    Style,
    SelectedAddons,
    AdditionalHoursCount,
    ClientName,
    ClientEmail,
    ClientPhone,
    Company,
    AdditionalNotes,
}

impl FormField {
    pub const ALL: &'static [FormField] = &[
        FormField::ServiceType,
        FormField::ServiceSubtype,
        FormField::Duration,
        FormField::EventDate,
        FormField::Location,
        FormField::Venue,
        FormField::DeliveryTime,
        FormField::Budget,
        FormField::Style,
        FormField::SelectedAddons,
        FormField::AdditionalHoursCount,
        FormField::ClientName,
        FormField::ClientEmail,
        FormField::ClientPhone,
        FormField::Company,
        FormField::AdditionalNotes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::ServiceType => "serviceType",
            FormField::ServiceSubtype => "serviceSubtype",
            FormField::Duration => "duration",
            FormField::EventDate => "eventDate",
            FormField::Location => "location",
            FormField::Venue => "venue",
            FormField::DeliveryTime => "deliveryTime",
            FormField::Budget => "budget",
            FormField::Style => "style",
            FormField::SelectedAddons => "selectedAddons",
            FormField::AdditionalHoursCount => "additionalHoursCount",
            FormField::ClientName => "clientName",
            FormField::ClientEmail => "clientEmail",
            FormField::ClientPhone => "clientPhone",
            FormField::Company => "company",
            FormField::AdditionalNotes => "additionalNotes",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormField {
    type Err = FieldParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        FormField::ALL.iter().copied().find(|field| field.as_str() == value.trim()).ok_or_else(
            || FieldParseError::UnknownOption {
                field: "form field",
                value: value.to_string(),
                expected: FormField::ALL
                    .iter()
                    .map(FormField::as_str)
                    .collect::<Vec<_>>()
                    .join("|"),
            },
        )
    }
}

/// Everything the client has entered so far. Every field is optional until
/// the step that requires it is validated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuoteFormData {
    pub service_type: Option<ServiceType>,
    pub service_subtype: Option<String>,
    pub duration: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub location: Option<Location>,
    pub venue: Option<Venue>,
    pub delivery_time: Option<DeliveryTime>,
    pub budget: Option<Budget>,
    pub style: Option<Style>,
    pub selected_addons: BTreeSet<String>,
    pub additional_hours_count: u32,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub company: Option<String>,
    pub additional_notes: Option<String>,
}

impl Default for QuoteFormData {
    fn default() -> Self {
        Self {
            service_type: None,
            service_subtype: None,
            duration: None,
            event_date: None,
            location: None,
            venue: None,
            delivery_time: None,
            budget: None,
            style: None,
            selected_addons: BTreeSet::new(),
            additional_hours_count: MIN_ADDITIONAL_HOURS,
            client_name: None,
            client_email: None,
            client_phone: None,
            company: None,
            additional_notes: None,
        }
    }
}

impl QuoteFormData {
    pub fn delivery_time_or_default(&self) -> DeliveryTime {
        self.delivery_time.unwrap_or(DeliveryTime::Standard)
    }

    /// Additional-hours count as priced: always inside `1..=12`.
    pub fn effective_additional_hours(&self) -> u32 {
        clamp_additional_hours(self.additional_hours_count)
    }

    /// Non-empty value of a free-text field, if any.
    pub fn text(&self, field: FormField) -> Option<&str> {
        let value = match field {
            FormField::ServiceSubtype => self.service_subtype.as_deref(),
            FormField::Duration => self.duration.as_deref(),
            FormField::ClientName => self.client_name.as_deref(),
            FormField::ClientEmail => self.client_email.as_deref(),
            FormField::ClientPhone => self.client_phone.as_deref(),
            FormField::Company => self.company.as_deref(),
            FormField::AdditionalNotes => self.additional_notes.as_deref(),
            _ => None,
        };
        value.map(str::trim).filter(|value| !value.is_empty())
    }

    /// Whether a field carries a usable value.
    pub fn is_present(&self, field: FormField) -> bool {
        match field {
            FormField::ServiceType => self.service_type.is_some(),
            FormField::EventDate => self.event_date.is_some(),
            FormField::Location => self.location.is_some(),
            FormField::Venue => self.venue.is_some(),
            FormField::DeliveryTime => self.delivery_time.is_some(),
            FormField::Budget => self.budget.is_some(),
            FormField::Style => self.style.is_some(),
            FormField::SelectedAddons => !self.selected_addons.is_empty(),
            FormField::AdditionalHoursCount => true,
            text_field => self.text(text_field).is_some(),
        }
    }
}

pub fn clamp_additional_hours(count: u32) -> u32 {
    count.clamp(MIN_ADDITIONAL_HOURS, MAX_ADDITIONAL_HOURS)
}

/// A single typed field change coming from the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum FieldEdit {
    ServiceType(Option<ServiceType>),
    ServiceSubtype(Option<String>),
    Duration(Option<String>),
    EventDate(Option<NaiveDate>),
    Location(Option<Location>),
    Venue(Option<Venue>),
    DeliveryTime(Option<DeliveryTime>),
    Budget(Option<Budget>),
    Style(Option<Style>),
    AdditionalHoursCount(u32),
    ClientName(Option<String>),
    ClientEmail(Option<String>),
    ClientPhone(Option<String>),
    Company(Option<String>),
    AdditionalNotes(Option<String>),
}

impl FieldEdit {
    pub fn field(&self) -> FormField {
        match self {
            FieldEdit::ServiceType(_) => FormField::ServiceType,
            FieldEdit::ServiceSubtype(_) => FormField::ServiceSubtype,
            FieldEdit::Duration(_) => FormField::Duration,
            FieldEdit::EventDate(_) => FormField::EventDate,
            FieldEdit::Location(_) => FormField::Location,
            FieldEdit::Venue(_) => FormField::Venue,
            FieldEdit::DeliveryTime(_) => FormField::DeliveryTime,
            FieldEdit::Budget(_) => FormField::Budget,
            FieldEdit::Style(_) => FormField::Style,
            FieldEdit::AdditionalHoursCount(_) => FormField::AdditionalHoursCount,
            FieldEdit::ClientName(_) => FormField::ClientName,
            FieldEdit::ClientEmail(_) => FormField::ClientEmail,
            FieldEdit::ClientPhone(_) => FormField::ClientPhone,
            FieldEdit::Company(_) => FormField::Company,
            FieldEdit::AdditionalNotes(_) => FormField::AdditionalNotes,
        }
    }

    /// Parses a raw control value. Blank input clears the field.
    pub fn parse(field: FormField, raw: &str) -> Result<Self, FieldParseError> {
        let trimmed = raw.trim();
        let text = (!trimmed.is_empty()).then(|| trimmed.to_string());

        let edit = match field {
            FormField::ServiceType => FieldEdit::ServiceType(parse_option(trimmed)?),
            FormField::ServiceSubtype => FieldEdit::ServiceSubtype(text),
            FormField::Duration => FieldEdit::Duration(text),
            FormField::EventDate => FieldEdit::EventDate(
                text.as_deref()
                    .map(|value| {
                        NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|error| {
                            FieldParseError::Malformed {
                                field: "event date",
                                value: value.to_string(),
                                reason: error.to_string(),
                            }
                        })
                    })
                    .transpose()?,
            ),
            FormField::Location => FieldEdit::Location(parse_option(trimmed)?),
            FormField::Venue => FieldEdit::Venue(parse_option(trimmed)?),
            FormField::DeliveryTime => FieldEdit::DeliveryTime(parse_option(trimmed)?),
            FormField::Budget => FieldEdit::Budget(parse_option(trimmed)?),
            FormField::Style => FieldEdit::Style(parse_option(trimmed)?),
            // Unparseable counts fall back to one hour.
            FormField::AdditionalHoursCount => FieldEdit::AdditionalHoursCount(
                trimmed.parse::<u32>().unwrap_or(MIN_ADDITIONAL_HOURS),
            ),
            FormField::ClientName => FieldEdit::ClientName(text),
            FormField::ClientEmail => FieldEdit::ClientEmail(text),
            FormField::ClientPhone => FieldEdit::ClientPhone(text),
            FormField::Company => FieldEdit::Company(text),
            FormField::AdditionalNotes => FieldEdit::AdditionalNotes(text),
            FormField::SelectedAddons => return Err(FieldParseError::NotEditable(field)),
        };
        Ok(edit)
    }
}

fn parse_option<T>(raw: &str) -> Result<Option<T>, FieldParseError>
where
    T: FromStr<Err = FieldParseError>,
{
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some)
}
