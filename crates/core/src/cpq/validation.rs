use std::collections::BTreeSet;

use crate::domain::{FormField, QuoteFormData, WizardStep};

/// Fields a step cannot be left without. Step 3 is all optional extras.
pub fn required_fields(step: WizardStep) -> &'static [FormField] {
    match step {
        WizardStep::Service => {
            &[FormField::ServiceType, FormField::ServiceSubtype, FormField::Duration]
        }
        WizardStep::Details => &[FormField::Location, FormField::Venue],
        WizardStep::Preferences => &[],
        WizardStep::Contact => {
            &[FormField::ClientName, FormField::ClientEmail, FormField::ClientPhone]
        }
    }
}

/// Missing or invalid fields for one step. Empty means the step is complete.
pub fn validate_step(form: &QuoteFormData, step: WizardStep) -> BTreeSet<FormField> {
    let mut invalid: BTreeSet<FormField> = required_fields(step)
        .iter()
        .copied()
        .filter(|field| !form.is_present(*field))
        .collect();

    if step == WizardStep::Contact {
        if let Some(email) = form.text(FormField::ClientEmail) {
            if !looks_like_email(email) {
                invalid.insert(FormField::ClientEmail);
            }
        }
    }

    invalid
}

/// Furthest step the client may jump to: the first step that fails
/// validation, or the last step when everything passes.
pub fn max_accessible_step(form: &QuoteFormData) -> WizardStep {
    WizardStep::ALL
        .into_iter()
        .find(|step| !validate_step(form, *step).is_empty())
        .unwrap_or(WizardStep::Contact)
}

fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@')
}

#[cfg(test)]
mod tests {
    use super::{max_accessible_step, validate_step};
    use crate::domain::{FormField, Location, QuoteFormData, ServiceType, Venue, WizardStep};

    fn service_selected() -> QuoteFormData {
        QuoteFormData {
            service_type: Some(ServiceType::Videography),
            service_subtype: Some("Corporate Video".to_string()),
            duration: Some("Complete Project".to_string()),
            ..QuoteFormData::default()
        }
    }

    #[test]
    fn empty_form_fails_service_step_on_all_three_fields() {
        let missing = validate_step(&QuoteFormData::default(), WizardStep::Service);
        assert_eq!(
            missing.into_iter().collect::<Vec<_>>(),
            vec![FormField::ServiceType, FormField::ServiceSubtype, FormField::Duration]
        );
    }

    #[test]
    fn preferences_step_has_no_requirements() {
        assert!(validate_step(&QuoteFormData::default(), WizardStep::Preferences).is_empty());
    }

    #[test]
    fn details_step_requires_location_and_venue() {
        let form = QuoteFormData { venue: Some(Venue::Studio), ..service_selected() };
        let missing = validate_step(&form, WizardStep::Details);
        assert!(missing.contains(&FormField::Location));
        assert_eq!(missing.len(), 1);
    }

    #[test]
    fn contact_step_flags_blank_and_malformed_values() {
        let form = QuoteFormData {
            client_name: Some("  ".to_string()),
            client_email: Some("not-an-email".to_string()),
            client_phone: Some("+971 50 123 4567".to_string()),
            ..QuoteFormData::default()
        };
        let missing = validate_step(&form, WizardStep::Contact);
        assert!(missing.contains(&FormField::ClientName));
        assert!(missing.contains(&FormField::ClientEmail));
        assert!(!missing.contains(&FormField::ClientPhone));

        let form = QuoteFormData {
            client_email: Some("ana@studio.ae".to_string()),
            ..form
        };
        assert!(!validate_step(&form, WizardStep::Contact).contains(&FormField::ClientEmail));
    }

    #[test]
    fn max_accessible_step_tracks_first_failing_step() {
        assert_eq!(max_accessible_step(&QuoteFormData::default()), WizardStep::Service);

        let form = service_selected();
        assert_eq!(max_accessible_step(&form), WizardStep::Details);

        let form = QuoteFormData {
            location: Some(Location::Sharjah),
            venue: Some(Venue::Outdoor),
            ..form
        };
        assert_eq!(max_accessible_step(&form), WizardStep::Contact);

        // A later step can never be reached past an invalid earlier one.
        let form = QuoteFormData { service_subtype: None, ..form };
        assert_eq!(max_accessible_step(&form), WizardStep::Service);
    }
}
