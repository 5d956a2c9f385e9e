use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::TierRef;

/// Reasons a pricing configuration is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricingError {
    #[error("at least one price tier is required")]
    EmptyTierList,

    #[error("tier {index}: {field} {message}")]
    InvalidTier {
        index: usize,
        field: &'static str,
        message: String,
    },

    #[error("discount {index}: {field} {message}")]
    InvalidDiscount {
        index: usize,
        field: &'static str,
        message: String,
    },

    #[error("discount {discount_index} references unknown price tier '{tier}'")]
    DanglingDiscountReference { discount_index: usize, tier: TierRef },

    #[error("price tier '{tier}' has more than one discount with cutoff {cutoff_date}")]
    AmbiguousDiscount { tier: TierRef, cutoff_date: NaiveDate },
}

impl PricingError {
    pub(crate) fn tier(index: usize, field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidTier {
            index,
            field,
            message: message.into(),
        }
    }

    pub(crate) fn discount(index: usize, field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidDiscount {
            index,
            field,
            message: message.into(),
        }
    }

    /// Dotted path of the form field this error belongs to.
    pub fn field_path(&self) -> String {
        match self {
            PricingError::EmptyTierList => "tiers".to_string(),
            PricingError::InvalidTier { index, field, .. } => format!("tiers.{}.{}", index, field),
            PricingError::InvalidDiscount { index, field, .. } => {
                format!("discounts.{}.{}", index, field)
            }
            PricingError::DanglingDiscountReference { discount_index, .. } => {
                format!("discounts.{}.price_tier_id", discount_index)
            }
            PricingError::AmbiguousDiscount { .. } => "discounts".to_string(),
        }
    }

    fn field_message(&self) -> String {
        match self {
            PricingError::InvalidTier { message, .. }
            | PricingError::InvalidDiscount { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Every problem found in one submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pricing configuration is invalid ({count} problem(s))", count = .0.len())]
pub struct ValidationErrors(Vec<PricingError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[PricingError] {
        &self.0
    }

    /// Groups messages by field path, in the shape the pricing form renders.
    pub fn flatten(&self) -> BTreeMap<String, Vec<String>> {
        let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for error in &self.0 {
            fields
                .entry(error.field_path())
                .or_default()
                .push(error.field_message());
        }
        fields
    }
}

impl From<PricingError> for ValidationErrors {
    fn from(error: PricingError) -> Self {
        Self(vec![error])
    }
}

impl From<Vec<PricingError>> for ValidationErrors {
    fn from(errors: Vec<PricingError>) -> Self {
        Self(errors)
    }
}
