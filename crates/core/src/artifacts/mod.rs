//! Renderers that turn a priced quote into something the client can keep:
//! a mail draft and a printable document. Both read the same
//! [`PricingDetails`] the wizard stored and never price anything themselves.

pub mod document;
pub mod handoff;
pub mod message;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::cpq::pricing::PricingDetails;
use crate::domain::QuoteFormData;

pub use document::{
    document_filename, DocumentRenderer, HtmlRenderer, QuoteDocument, QuoteDocumentGenerator,
    RenderedDocument, WkhtmltopdfRenderer,
};
pub use handoff::{
    DirectoryFileSink, FileSink, HandoffError, InMemoryFileSink, InMemoryMailComposer,
    MailComposer, OutboxMailComposer, SavedFile,
};
pub use message::{compose_quote_message, MailDraft};

/// Business identity printed on every artifact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudioProfile {
    pub company_name: String,
    pub quote_recipient: String,
    pub contact_email: String,
    pub currency: String,
    pub reference_prefix: String,
}

impl Default for StudioProfile {
    fn default() -> Self {
        Self {
            company_name: "White Rabbit Hole".to_string(),
            quote_recipient: "hi@wrh.ae".to_string(),
            contact_email: "hi@wrh.ae".to_string(),
            currency: "AED".to_string(),
            reference_prefix: "WRH".to_string(),
        }
    }
}

/// Reference number and issue date shared by the message and the document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteStamp {
    pub reference: String,
    pub issued_on: NaiveDate,
}

impl QuoteStamp {
    pub fn new(reference: impl Into<String>, issued_on: NaiveDate) -> Self {
        Self { reference: reference.into(), issued_on }
    }

    /// `PREFIX-NNNNNN` from the last six digits of the current epoch millis.
    pub fn now(prefix: &str) -> Self {
        let now = Utc::now();
        let suffix = now.timestamp_millis().rem_euclid(1_000_000);
        Self { reference: format!("{prefix}-{suffix:06}"), issued_on: now.date_naive() }
    }
}

/// The pair both generators consume, plus the context they print around it.
#[derive(Clone, Copy, Debug)]
pub struct QuoteSummary<'a> {
    pub form: &'a QuoteFormData,
    pub pricing: &'a PricingDetails,
    pub stamp: &'a QuoteStamp,
    pub studio: &'a StudioProfile,
}

impl<'a> QuoteSummary<'a> {
    pub(crate) fn service_label(&self) -> &'a str {
        self.form.service_type.map(|service| service.label()).unwrap_or(NOT_PROVIDED)
    }

    pub(crate) fn event_date_label(&self) -> String {
        self.form
            .event_date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| NOT_PROVIDED.to_string())
    }

    pub(crate) fn location_label(&self) -> &'a str {
        self.form.location.map(|location| location.label()).unwrap_or(NOT_PROVIDED)
    }

    pub(crate) fn venue_label(&self) -> &'a str {
        self.form.venue.map(|venue| venue.label()).unwrap_or(NOT_PROVIDED)
    }

    pub(crate) fn style_label(&self) -> &'a str {
        self.form.style.map(|style| style.label()).unwrap_or(NOT_PROVIDED)
    }

    pub(crate) fn delivery_label(&self) -> &'a str {
        self.form.delivery_time_or_default().label()
    }

    pub(crate) fn text_or_placeholder(&self, value: Option<&'a str>) -> &'a str {
        value.unwrap_or(NOT_PROVIDED)
    }
}

pub(crate) const NOT_PROVIDED: &str = "N/A";

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::BTreeSet;

    use chrono::NaiveDate;

    use super::{QuoteStamp, StudioProfile};
    use crate::cpq::catalog::builtin_catalog;
    use crate::cpq::pricing::{price_quote, PricingDetails};
    use crate::domain::{DeliveryTime, Location, QuoteFormData, ServiceType, Style, Venue};

    pub fn cinematic_rush_form() -> QuoteFormData {
        QuoteFormData {
            service_type: Some(ServiceType::Photography),
            service_subtype: Some("Event Photography".to_string()),
            duration: Some("Half Day (4 hours)".to_string()),
            event_date: NaiveDate::from_ymd_opt(2026, 12, 5),
            location: Some(Location::AbuDhabi),
            venue: Some(Venue::Ballroom),
            style: Some(Style::Cinematic),
            delivery_time: Some(DeliveryTime::Rush),
            selected_addons: ["Second Photographer", "Additional Hours"]
                .into_iter()
                .map(str::to_string)
                .collect::<BTreeSet<_>>(),
            additional_hours_count: 2,
            client_name: Some("Layla O'Neil".to_string()),
            client_email: Some("layla@example.com".to_string()),
            client_phone: Some("+971 50 123 4567".to_string()),
            company: Some("Oasis Events".to_string()),
            additional_notes: Some("Gala dinner <VIP> table shots".to_string()),
            ..QuoteFormData::default()
        }
    }

    pub fn priced(form: &QuoteFormData) -> PricingDetails {
        price_quote(form, builtin_catalog()).expect("fixture form should price")
    }

    pub fn stamp() -> QuoteStamp {
        QuoteStamp::new("WRH-123456", NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date"))
    }

    pub fn studio() -> StudioProfile {
        StudioProfile::default()
    }
}

#[cfg(test)]
mod tests {
    use super::QuoteStamp;

    #[test]
    fn stamp_reference_has_prefix_and_six_digits() {
        let stamp = QuoteStamp::now("WRH");
        let (prefix, digits) = stamp.reference.split_once('-').expect("reference has a dash");
        assert_eq!(prefix, "WRH");
        assert_eq!(digits.len(), 6);
        assert!(digits.chars().all(|ch| ch.is_ascii_digit()));
    }
}
