//! Convention pricing: price tiers, early-bird discounts and the rules that
//! tie them together. Everything here is pure; loading and saving lives in
//! [`crate::store`].

pub mod error;
pub mod identifiers;
pub mod resolve;
pub mod schedule;
pub mod validation;

pub use error::{PricingError, ValidationErrors};
pub use identifiers::assign_identifiers;
pub use resolve::{
    active_discount, resolve_effective_price, resolve_effective_price_today, EffectivePrice,
};
pub use schedule::{build_display_schedule, DisplaySchedule, ScheduleCell, ScheduleColumn, ScheduleRow};
pub use validation::validate_configuration;
