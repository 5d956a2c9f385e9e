//! PostgreSQL access for conventions and their pricing.

pub mod convention;
pub mod pricing;

use thiserror::Error;

use crate::pricing::PricingError;

pub use convention::load_convention;
pub use pricing::{load_pricing_configuration, save_pricing_configuration};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// The submission names rows the database holds for another convention.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}
