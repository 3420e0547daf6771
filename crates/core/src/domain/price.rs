use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Inclusive estimate band. Always `0 <= min <= max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPriceRange")]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PriceRangeError {
    #[error("price range bounds must be non-negative (min {min}, max {max})")]
    Negative { min: Decimal, max: Decimal },
    #[error("price range min {min} exceeds max {max}")]
    Inverted { min: Decimal, max: Decimal },
}

impl PriceRange {
    pub const ZERO: PriceRange = PriceRange { min: Decimal::ZERO, max: Decimal::ZERO };

    pub fn new(min: Decimal, max: Decimal) -> Result<Self, PriceRangeError> {
        if min < Decimal::ZERO || max < Decimal::ZERO {
            return Err(PriceRangeError::Negative { min, max });
        }
        if min > max {
            return Err(PriceRangeError::Inverted { min, max });
        }
        Ok(Self { min, max })
    }

    /// Whole-unit constructor for static price lists.
    pub(crate) fn whole(min: u32, max: u32) -> Self {
        let (low, high) = if min <= max { (min, max) } else { (max, min) };
        Self { min: Decimal::from(low), max: Decimal::from(high) }
    }

    /// Scales both bounds. Non-negative factors keep the invariant; `None`
    /// when a bound overflows.
    pub fn checked_scale(self, factor: Decimal) -> Option<Self> {
        Some(Self { min: self.min.checked_mul(factor)?, max: self.max.checked_mul(factor)? })
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        Some(Self { min: self.min.checked_add(rhs.min)?, max: self.max.checked_add(rhs.max)? })
    }

    pub fn is_zero(&self) -> bool {
        self.min.is_zero() && self.max.is_zero()
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", format_amount(self.min), format_amount(self.max))
    }
}

#[derive(Deserialize)]
struct RawPriceRange {
    min: Decimal,
    max: Decimal,
}

impl TryFrom<RawPriceRange> for PriceRange {
    type Error = PriceRangeError;

    fn try_from(raw: RawPriceRange) -> Result<Self, Self::Error> {
        PriceRange::new(raw.min, raw.max)
    }
}

/// Renders an amount with `,` thousands grouping and at most two fraction
/// digits, trailing zeros dropped: `2750`, `1,312.5`, `20,000`.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(2).normalize();
    let text = rounded.abs().to_string();
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3 + 4);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        grouped.push('-');
    }
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{format_amount, PriceRange, PriceRangeError};

    #[test]
    fn rejects_inverted_and_negative_ranges() {
        assert!(matches!(
            PriceRange::new(Decimal::from(10), Decimal::from(5)),
            Err(PriceRangeError::Inverted { .. })
        ));
        assert!(matches!(
            PriceRange::new(Decimal::from(-1), Decimal::from(5)),
            Err(PriceRangeError::Negative { .. })
        ));
        assert!(PriceRange::new(Decimal::ZERO, Decimal::ZERO).is_ok());
    }

    #[test]
    fn deserialization_enforces_bounds() {
        let parsed: Result<PriceRange, _> = serde_json::from_str(r#"{"min": "900", "max": "100"}"#);
        assert!(parsed.is_err());

        let parsed: PriceRange =
            serde_json::from_str(r#"{"min": 100, "max": 900}"#).expect("valid range");
        assert_eq!(parsed, PriceRange::whole(100, 900));
    }

    #[test]
    fn add_and_scale_are_elementwise() {
        let sum = PriceRange::whole(100, 200).checked_add(PriceRange::whole(5, 10));
        assert_eq!(sum, Some(PriceRange::whole(105, 210)));
        assert_eq!(
            PriceRange::whole(1200, 2000).checked_scale(Decimal::new(15, 1)),
            Some(PriceRange::whole(1800, 3000))
        );
    }

    #[test]
    fn overflowing_bounds_are_reported_instead_of_panicking() {
        let huge = PriceRange::new(Decimal::MAX, Decimal::MAX).expect("valid range");
        assert_eq!(huge.checked_scale(Decimal::TWO), None);
        assert_eq!(huge.checked_add(PriceRange::whole(1, 1)), None);
    }

    #[test]
    fn amounts_group_thousands_and_trim_zeros() {
        assert_eq!(format_amount(Decimal::from(2750)), "2,750");
        assert_eq!(format_amount(Decimal::new(225000, 2)), "2,250");
        assert_eq!(format_amount(Decimal::new(13125, 1)), "1,312.5");
        assert_eq!(format_amount(Decimal::from(20)), "20");
        assert_eq!(format_amount(Decimal::from(1_000_000)), "1,000,000");
        assert_eq!(format_amount(Decimal::ZERO), "0");
    }

    #[test]
    fn display_renders_both_bounds() {
        assert_eq!(PriceRange::whole(2750, 5250).to_string(), "2,750 - 5,250");
    }
}
