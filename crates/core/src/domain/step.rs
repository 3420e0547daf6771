use std::fmt;

use serde::{Deserialize, Serialize};

/// The four wizard pages, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum WizardStep {
    Service = 1,
    Details = 2,
    Preferences = 3,
    Contact = 4,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] =
        [WizardStep::Service, WizardStep::Details, WizardStep::Preferences, WizardStep::Contact];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(WizardStep::Service),
            2 => Some(WizardStep::Details),
            3 => Some(WizardStep::Preferences),
            4 => Some(WizardStep::Contact),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WizardStep::Service => "Service",
            WizardStep::Details => "Details",
            WizardStep::Preferences => "Preferences",
            WizardStep::Contact => "Contact",
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        Self::from_number(self.number().checked_sub(1)?)
    }
}

impl From<WizardStep> for u8 {
    fn from(step: WizardStep) -> Self {
        step.number()
    }
}

impl TryFrom<u8> for WizardStep {
    type Error = String;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        Self::from_number(number).ok_or_else(|| format!("wizard step must be 1..=4, got {number}"))
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.label())
    }
}
