use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Reference from a discount to the tier it reduces.
///
/// Persisted tiers are referenced by id. Tiers that have not been saved yet
/// are referenced by the `draft_key` the client gave them; those references
/// are rewritten once identifiers are assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TierRef {
    Saved(Uuid),
    Draft(String),
}

impl From<String> for TierRef {
    fn from(raw: String) -> Self {
        match Uuid::parse_str(raw.trim()) {
            Ok(id) => TierRef::Saved(id),
            Err(_) => TierRef::Draft(raw.trim().to_string()),
        }
    }
}

impl From<TierRef> for String {
    fn from(reference: TierRef) -> Self {
        reference.to_string()
    }
}

impl From<&str> for TierRef {
    fn from(raw: &str) -> Self {
        TierRef::from(raw.to_string())
    }
}

impl fmt::Display for TierRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierRef::Saved(id) => write!(f, "{}", id),
            TierRef::Draft(key) => f.write_str(key),
        }
    }
}

/// One attendee category's base price for a convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTier {
    pub id: Option<Uuid>,
    pub convention_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_key: Option<String>,
    pub label: String,
    pub amount: Decimal,
    pub order: u32,
}

impl PriceTier {
    /// How discounts refer to this tier: by id once saved, by draft key before.
    pub fn reference(&self) -> Option<TierRef> {
        match (&self.id, &self.draft_key) {
            (Some(id), _) => Some(TierRef::Saved(*id)),
            (None, Some(key)) => Some(TierRef::Draft(key.clone())),
            (None, None) => None,
        }
    }

    /// Unsaved tiers may use a UUID-shaped draft key, which a discount's
    /// reference parses as `Saved`; those still point at the draft.
    pub fn is_referenced_by(&self, discount: &PriceDiscount) -> bool {
        match (&self.id, &self.draft_key, &discount.price_tier_id) {
            (Some(id), _, TierRef::Saved(target)) => id == target,
            (Some(_), _, TierRef::Draft(_)) => false,
            (None, Some(key), TierRef::Draft(target)) => key == target,
            (None, Some(key), TierRef::Saved(target)) => draft_key_matches_id(key, target),
            (None, None, _) => false,
        }
    }
}

/// Whether a draft key is the text form of `id`, in any UUID spelling.
pub fn draft_key_matches_id(key: &str, id: &Uuid) -> bool {
    Uuid::parse_str(key.trim()).map_or(false, |parsed| parsed == *id)
}

/// A reduced price for one tier, valid for purchases strictly before `cutoff_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceDiscount {
    pub id: Option<Uuid>,
    pub convention_id: Option<Uuid>,
    pub cutoff_date: NaiveDate,
    pub price_tier_id: TierRef,
    pub discounted_amount: Decimal,
}

impl PriceDiscount {
    pub fn is_active_on(&self, as_of: NaiveDate) -> bool {
        self.cutoff_date > as_of
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PricingConfiguration {
    pub tiers: Vec<PriceTier>,
    pub discounts: Vec<PriceDiscount>,
}

/// Tier as submitted from the pricing form, before coercion.
///
/// Every field is kept as raw JSON so that a wrongly typed value becomes a
/// field error instead of rejecting the whole submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceTierDraft {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub convention_id: Value,
    #[serde(default)]
    pub draft_key: Value,
    #[serde(default)]
    pub label: Value,
    #[serde(default)]
    pub amount: Value,
    #[serde(default)]
    pub order: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceDiscountDraft {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub convention_id: Value,
    #[serde(default)]
    pub cutoff_date: Value,
    #[serde(default)]
    pub price_tier_id: Value,
    #[serde(default)]
    pub discounted_amount: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingDraft {
    #[serde(default)]
    pub tiers: Vec<PriceTierDraft>,
    #[serde(default)]
    pub discounts: Vec<PriceDiscountDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PriceTierRow {
    pub id: Uuid,
    pub convention_id: Uuid,
    pub label: String,
    pub amount: Decimal,
    pub display_order: i32,
    pub position: i32,
}

impl From<PriceTierRow> for PriceTier {
    fn from(row: PriceTierRow) -> Self {
        Self {
            id: Some(row.id),
            convention_id: Some(row.convention_id),
            draft_key: None,
            label: row.label,
            amount: row.amount,
            order: u32::try_from(row.display_order).unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PriceDiscountRow {
    pub id: Uuid,
    pub convention_id: Uuid,
    pub price_tier_id: Uuid,
    pub cutoff_date: NaiveDate,
    pub discounted_amount: Decimal,
    pub position: i32,
}

impl From<PriceDiscountRow> for PriceDiscount {
    fn from(row: PriceDiscountRow) -> Self {
        Self {
            id: Some(row.id),
            convention_id: Some(row.convention_id),
            cutoff_date: row.cutoff_date,
            price_tier_id: TierRef::Saved(row.price_tier_id),
            discounted_amount: row.discounted_amount,
        }
    }
}

/// A configuration with every identifier assigned, ready to be written.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PersistablePricing {
    pub tiers: Vec<PriceTierRow>,
    pub discounts: Vec<PriceDiscountRow>,
}

impl From<PersistablePricing> for PricingConfiguration {
    fn from(pricing: PersistablePricing) -> Self {
        Self {
            tiers: pricing.tiers.into_iter().map(PriceTier::from).collect(),
            discounts: pricing
                .discounts
                .into_iter()
                .map(PriceDiscount::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ref_parses_uuid_or_draft_key() {
        let id = Uuid::new_v4();
        assert_eq!(TierRef::from(id.to_string()), TierRef::Saved(id));
        assert_eq!(TierRef::from(" Adult "), TierRef::Draft("Adult".to_string()));
    }

    #[test]
    fn test_tier_ref_serializes_as_plain_string() {
        let id = Uuid::new_v4();
        let json = serde_json::to_string(&TierRef::Saved(id)).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }

    #[test]
    fn test_discount_active_strictly_before_cutoff() {
        let discount = PriceDiscount {
            id: None,
            convention_id: None,
            cutoff_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            price_tier_id: TierRef::from("Adult"),
            discounted_amount: Decimal::new(40, 0),
        };
        assert!(discount.is_active_on(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()));
        assert!(!discount.is_active_on(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
    }

    #[test]
    fn test_uuid_shaped_draft_key_matches_saved_reference() {
        let key = "3F2B8C1E-9A4D-4E6F-8B2A-1C0D9E8F7A6B";
        let tier = PriceTier {
            id: None,
            convention_id: None,
            draft_key: Some(key.to_string()),
            label: "Adult".to_string(),
            amount: Decimal::new(60, 0),
            order: 0,
        };
        let discount = PriceDiscount {
            id: None,
            convention_id: None,
            cutoff_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            price_tier_id: TierRef::from(key.to_lowercase()),
            discounted_amount: Decimal::new(45, 0),
        };
        assert!(matches!(discount.price_tier_id, TierRef::Saved(_)));
        assert!(tier.is_referenced_by(&discount));
    }

    #[test]
    fn test_unsaved_tier_referenced_by_draft_key() {
        let tier = PriceTier {
            id: None,
            convention_id: None,
            draft_key: Some("youth".to_string()),
            label: "Youth".to_string(),
            amount: Decimal::new(30, 0),
            order: 1,
        };
        assert_eq!(tier.reference(), Some(TierRef::Draft("youth".to_string())));
    }
}
