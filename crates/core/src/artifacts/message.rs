use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::artifacts::{QuoteSummary, NOT_PROVIDED};
use crate::domain::{format_amount, FormField, PriceRange};

const HEAVY_RULE: &str = "==================================================";
const LIGHT_RULE: &str = "--------------------------------------------------";

/// What the mail handoff receives: who to write to, and what to say.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailDraft {
    pub reference: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl MailDraft {
    /// `mailto:` link with subject and body percent-encoded.
    pub fn mailto_uri(&self) -> String {
        format!(
            "mailto:{}?subject={}&body={}",
            self.recipient,
            percent_encode(&self.subject),
            percent_encode(&self.body)
        )
    }
}

pub fn compose_quote_message(summary: &QuoteSummary<'_>) -> MailDraft {
    MailDraft {
        reference: summary.stamp.reference.clone(),
        recipient: summary.studio.quote_recipient.clone(),
        subject: subject_line(summary),
        body: message_body(summary),
    }
}

fn subject_line(summary: &QuoteSummary<'_>) -> String {
    let subject = format!(
        "New quote request - {} - {}",
        summary.form.text(FormField::ClientName).unwrap_or("Client"),
        summary.form.text(FormField::ServiceSubtype).unwrap_or("Service")
    );
    single_line(&subject)
}

/// Collapses every whitespace or control run to one space so a value can
/// sit in a mail header.
pub(crate) fn single_line(value: &str) -> String {
    value
        .split(|c: char| c.is_whitespace() || c.is_control())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn message_body(summary: &QuoteSummary<'_>) -> String {
    let form = summary.form;
    let pricing = summary.pricing;
    let currency = summary.studio.currency.as_str();
    let mut body = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(body, "NEW QUOTE REQUEST - {}", summary.studio.company_name.to_uppercase());
    let _ = writeln!(body, "{HEAVY_RULE}\n");
    let _ = writeln!(body, "Date: {}", summary.stamp.issued_on.format("%Y-%m-%d"));
    let _ = writeln!(body, "Quote #: {}\n", summary.stamp.reference);

    section(&mut body, "CLIENT INFORMATION");
    for (label, field) in [
        ("Name", FormField::ClientName),
        ("Email", FormField::ClientEmail),
        ("Phone", FormField::ClientPhone),
    ] {
        let _ = writeln!(body, "{label}: {}", summary.text_or_placeholder(form.text(field)));
    }
    if let Some(company) = form.text(FormField::Company) {
        let _ = writeln!(body, "Company: {company}");
    }
    body.push('\n');

    section(&mut body, "PROJECT DETAILS");
    let _ = writeln!(body, "Service Type: {}", summary.service_label());
    let _ = writeln!(
        body,
        "Service Category: {}",
        form.text(FormField::ServiceSubtype).unwrap_or(NOT_PROVIDED)
    );
    let _ = writeln!(
        body,
        "Package/Duration: {}",
        form.text(FormField::Duration).unwrap_or(NOT_PROVIDED)
    );
    let _ = writeln!(body, "Event Date: {}", summary.event_date_label());
    let _ = writeln!(body, "Location: {}", summary.location_label());
    let _ = writeln!(body, "Venue: {}", summary.venue_label());
    let _ = writeln!(body, "Preferred Style: {}", summary.style_label());
    let _ = writeln!(body, "Delivery Timeline: {}", summary.delivery_label());
    if let Some(budget) = form.budget {
        let _ = writeln!(body, "Budget Range: {currency} {}", budget.label());
    }
    body.push('\n');

    if !pricing.addon_lines.is_empty() {
        section(&mut body, "SELECTED ADD-ONS");
        for line in &pricing.addon_lines {
            let label = if line.quantity > 1 {
                format!("{} x{}", line.name, line.quantity)
            } else {
                line.name.clone()
            };
            let _ = writeln!(body, "- {label}: {}", money(currency, line.price));
        }
        body.push('\n');
    }

    section(&mut body, "PRICING BREAKDOWN");
    let _ = writeln!(body, "Base Service: {}", money(currency, pricing.base));
    if !pricing.addons.is_zero() {
        let _ = writeln!(body, "Add-ons Total: {}", money(currency, pricing.addons));
    }
    if let Some(rush) = pricing.rush {
        let _ = writeln!(body, "Rush Delivery Fee: {}", money(currency, rush));
    }
    let _ = writeln!(body, "\nESTIMATED TOTAL: {}\n", money(currency, pricing.total));

    if let Some(notes) = form.text(FormField::AdditionalNotes) {
        section(&mut body, "ADDITIONAL NOTES");
        let _ = writeln!(body, "{notes}\n");
    }

    body
}

fn section(body: &mut String, title: &str) {
    let _ = writeln!(body, "{title}\n{LIGHT_RULE}");
}

fn money(currency: &str, range: PriceRange) -> String {
    format!("{currency} {} - {}", format_amount(range.min), format_amount(range.max))
}

/// RFC 3986 encoding: everything except unreserved characters is escaped.
fn percent_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(char::from(byte))
            }
            other => {
                let _ = write!(encoded, "%{other:02X}");
            }
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::{compose_quote_message, percent_encode, single_line};
    use crate::artifacts::fixtures::{cinematic_rush_form, priced, stamp, studio};
    use crate::artifacts::QuoteSummary;
    use crate::domain::QuoteFormData;

    #[test]
    fn message_carries_every_section_and_the_stored_breakdown() {
        let form = cinematic_rush_form();
        let pricing = priced(&form);
        let (stamp, studio) = (stamp(), studio());
        let draft = compose_quote_message(&QuoteSummary {
            form: &form,
            pricing: &pricing,
            stamp: &stamp,
            studio: &studio,
        });

        assert_eq!(draft.recipient, "hi@wrh.ae");
        assert_eq!(draft.subject, "New quote request - Layla O'Neil - Event Photography");
        assert_eq!(draft.reference, "WRH-123456");

        let body = &draft.body;
        assert!(body.contains("Date: 2026-10-16"));
        assert!(body.contains("Quote #: WRH-123456"));
        assert!(body.contains("Company: Oasis Events"));
        assert!(body.contains("Location: Abu Dhabi"));
        assert!(body.contains("Delivery Timeline: Rush (3-7 days)"));
        assert!(body.contains("- Additional Hours x2: AED 500 - 1,000"));
        assert!(body.contains("- Second Photographer: AED 500 - 1,500"));
        assert!(body.contains("Base Service: AED 1,800 - 3,000"));
        assert!(body.contains("Add-ons Total: AED 1,000 - 2,500"));
        assert!(body.contains("Rush Delivery Fee: AED 450 - 750"));
        assert!(body.contains("ESTIMATED TOTAL: AED 3,250 - 6,250"));
        assert!(body.contains("ADDITIONAL NOTES"));
    }

    #[test]
    fn optional_sections_are_omitted_when_empty() {
        let form = QuoteFormData {
            selected_addons: Default::default(),
            delivery_time: None,
            company: None,
            additional_notes: None,
            ..cinematic_rush_form()
        };
        let pricing = priced(&form);
        let (stamp, studio) = (stamp(), studio());
        let draft = compose_quote_message(&QuoteSummary {
            form: &form,
            pricing: &pricing,
            stamp: &stamp,
            studio: &studio,
        });

        assert!(!draft.body.contains("SELECTED ADD-ONS"));
        assert!(!draft.body.contains("Add-ons Total"));
        assert!(!draft.body.contains("Rush Delivery Fee"));
        assert!(!draft.body.contains("Company:"));
        assert!(!draft.body.contains("ADDITIONAL NOTES"));
        assert!(draft.body.contains("Delivery Timeline: Standard (7-14 days)"));
    }

    #[test]
    fn line_breaks_in_client_name_stay_out_of_the_subject() {
        let form = QuoteFormData {
            client_name: Some("Eve\r\nBcc: attacker@evil.test".to_string()),
            ..cinematic_rush_form()
        };
        let pricing = priced(&form);
        let (stamp, studio) = (stamp(), studio());
        let draft = compose_quote_message(&QuoteSummary {
            form: &form,
            pricing: &pricing,
            stamp: &stamp,
            studio: &studio,
        });

        assert_eq!(
            draft.subject,
            "New quote request - Eve Bcc: attacker@evil.test - Event Photography"
        );
        assert_eq!(single_line(" a\t\n b\u{0}c "), "a b c");
    }

    #[test]
    fn same_inputs_render_the_same_message() {
        let form = cinematic_rush_form();
        let pricing = priced(&form);
        let (stamp, studio) = (stamp(), studio());
        let summary =
            QuoteSummary { form: &form, pricing: &pricing, stamp: &stamp, studio: &studio };
        assert_eq!(compose_quote_message(&summary), compose_quote_message(&summary));
    }

    #[test]
    fn mailto_uri_escapes_reserved_characters() {
        assert_eq!(percent_encode("a b&c=d\n"), "a%20b%26c%3Dd%0A");
        assert_eq!(percent_encode("AED 1,800"), "AED%201%2C800");

        let form = cinematic_rush_form();
        let pricing = priced(&form);
        let (stamp, studio) = (stamp(), studio());
        let uri = compose_quote_message(&QuoteSummary {
            form: &form,
            pricing: &pricing,
            stamp: &stamp,
            studio: &studio,
        })
        .mailto_uri();
        assert!(uri.starts_with("mailto:hi@wrh.ae?subject=New%20quote%20request"));
        assert!(!uri.contains(' '));
        assert!(!uri.contains('\n'));
    }
}
