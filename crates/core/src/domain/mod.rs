pub mod form;
pub mod price;
pub mod step;

pub use form::{
    Budget, DeliveryTime, FieldEdit, FieldParseError, FormField, Location, QuoteFormData,
    ServiceType, Style, Venue,
};
pub use price::{format_amount, PriceRange, PriceRangeError};
pub use step::WizardStep;
