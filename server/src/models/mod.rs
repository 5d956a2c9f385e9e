pub mod convention;
pub mod currency;
pub mod pricing;

pub use convention::Convention;
pub use currency::CurrencyCode;
pub use pricing::{
    PersistablePricing, PriceDiscount, PriceDiscountDraft, PriceDiscountRow, PriceTier,
    PriceTierDraft, PriceTierRow, PricingConfiguration, PricingDraft, TierRef,
};
