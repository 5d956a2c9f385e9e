use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

use super::error::{PricingError, ValidationErrors};
use crate::models::{
    PriceDiscount, PriceDiscountDraft, PriceTier, PriceTierDraft, PricingConfiguration, TierRef,
};

/// Validates and normalizes a submitted pricing configuration.
///
/// An empty tier list is rejected on its own. Otherwise every field error
/// across all tiers and discounts is collected; the cross-reference checks
/// only run once each item is individually valid.
pub fn validate_configuration(
    tiers: &[PriceTierDraft],
    discounts: &[PriceDiscountDraft],
) -> Result<PricingConfiguration, ValidationErrors> {
    if tiers.is_empty() {
        return Err(PricingError::EmptyTierList.into());
    }

    let mut errors = Vec::new();
    let valid_tiers = validate_tiers(tiers, &mut errors);
    let valid_discounts = validate_discounts(discounts, &mut errors);

    if !errors.is_empty() {
        debug!(count = errors.len(), "Pricing field validation failed");
        return Err(errors.into());
    }

    let mut configuration = PricingConfiguration {
        tiers: valid_tiers,
        discounts: valid_discounts,
    };
    check_references(&mut configuration, &mut errors);

    if errors.is_empty() {
        Ok(configuration)
    } else {
        debug!(count = errors.len(), "Pricing reference validation failed");
        Err(errors.into())
    }
}

fn validate_tiers(drafts: &[PriceTierDraft], errors: &mut Vec<PricingError>) -> Vec<PriceTier> {
    let mut tiers = Vec::with_capacity(drafts.len());
    let mut seen_ids = HashSet::new();
    let mut seen_keys = HashSet::new();

    for (index, draft) in drafts.iter().enumerate() {
        let before = errors.len();
        let mut fail = |field: &'static str, message: String| {
            errors.push(PricingError::tier(index, field, message))
        };

        let label = match parse_text(&draft.label) {
            Ok(Some(label)) => Some(label),
            Ok(None) => {
                fail("label", "is required".to_string());
                None
            }
            Err(message) => {
                fail("label", message);
                None
            }
        };

        let amount = parse_amount(&draft.amount)
            .map_err(|message| fail("amount", message))
            .ok();

        let order = parse_order(&draft.order)
            .map_err(|message| fail("order", message))
            .ok();

        let id = parse_id(&draft.id).map_err(|message| fail("id", message)).ok().flatten();
        if let Some(id) = id {
            if !seen_ids.insert(id) {
                fail("id", "is used by another tier".to_string());
            }
        }

        let convention_id = parse_id(&draft.convention_id)
            .map_err(|message| fail("convention_id", message))
            .ok()
            .flatten();

        let draft_key = parse_text(&draft.draft_key)
            .map_err(|message| fail("draft_key", message))
            .ok()
            .flatten();
        if let Some(key) = &draft_key {
            if !seen_keys.insert(key.clone()) {
                fail("draft_key", "is used by another tier".to_string());
            }
        }

        if let (Some(label), Some(amount), Some(order), true) =
            (label, amount, order, errors.len() == before)
        {
            tiers.push(PriceTier {
                id,
                convention_id,
                draft_key,
                label,
                amount,
                order,
            });
        }
    }

    tiers
}

fn validate_discounts(
    drafts: &[PriceDiscountDraft],
    errors: &mut Vec<PricingError>,
) -> Vec<PriceDiscount> {
    let mut discounts = Vec::with_capacity(drafts.len());
    let mut seen_ids = HashSet::new();

    for (index, draft) in drafts.iter().enumerate() {
        let before = errors.len();
        let mut fail = |field: &'static str, message: String| {
            errors.push(PricingError::discount(index, field, message))
        };

        let cutoff_date = match parse_text(&draft.cutoff_date) {
            Ok(Some(raw)) => parse_cutoff_date(&raw)
                .map_err(|message| fail("cutoff_date", message))
                .ok(),
            Ok(None) => {
                fail("cutoff_date", "is required".to_string());
                None
            }
            Err(_) => {
                fail("cutoff_date", "must be a date (YYYY-MM-DD)".to_string());
                None
            }
        };

        let discounted_amount = parse_amount(&draft.discounted_amount)
            .map_err(|message| fail("discounted_amount", message))
            .ok();

        let price_tier_id = match parse_text(&draft.price_tier_id) {
            Ok(Some(raw)) => Some(TierRef::from(raw)),
            Ok(None) => {
                fail("price_tier_id", "is required".to_string());
                None
            }
            Err(message) => {
                fail("price_tier_id", message);
                None
            }
        };

        let id = parse_id(&draft.id).map_err(|message| fail("id", message)).ok().flatten();
        if let Some(id) = id {
            if !seen_ids.insert(id) {
                fail("id", "is used by another discount".to_string());
            }
        }

        let convention_id = parse_id(&draft.convention_id)
            .map_err(|message| fail("convention_id", message))
            .ok()
            .flatten();

        if let (Some(cutoff_date), Some(discounted_amount), Some(price_tier_id), true) = (
            cutoff_date,
            discounted_amount,
            price_tier_id,
            errors.len() == before,
        ) {
            discounts.push(PriceDiscount {
                id,
                convention_id,
                cutoff_date,
                price_tier_id,
                discounted_amount,
            });
        }
    }

    discounts
}

/// Resolves each discount's tier reference against the submitted tiers.
///
/// References are rewritten to the form the tier itself uses: its id once
/// saved, its draft key before. A draft key that happens to be a UUID is
/// found even though the reference parsed as `Saved`.
fn check_references(configuration: &mut PricingConfiguration, errors: &mut Vec<PricingError>) {
    let saved: HashSet<Uuid> = configuration.tiers.iter().filter_map(|t| t.id).collect();
    let by_key: HashMap<&str, Option<Uuid>> = configuration
        .tiers
        .iter()
        .filter_map(|t| t.draft_key.as_deref().map(|key| (key, t.id)))
        .collect();
    let by_uuid_key: HashMap<Uuid, (&str, Option<Uuid>)> = by_key
        .iter()
        .filter_map(|(key, id)| Uuid::parse_str(key).ok().map(|parsed| (parsed, (*key, *id))))
        .collect();

    let mut pairs = HashSet::new();
    let mut reported = HashSet::new();

    for (index, discount) in configuration.discounts.iter_mut().enumerate() {
        let resolved = match &discount.price_tier_id {
            TierRef::Saved(id) if saved.contains(id) => Some(TierRef::Saved(*id)),
            TierRef::Saved(id) => match by_uuid_key.get(id) {
                Some((_, Some(tier_id))) => Some(TierRef::Saved(*tier_id)),
                Some((key, None)) => Some(TierRef::Draft(key.to_string())),
                None => None,
            },
            TierRef::Draft(key) => match by_key.get(key.as_str()) {
                Some(Some(id)) => Some(TierRef::Saved(*id)),
                Some(None) => Some(TierRef::Draft(key.clone())),
                None => None,
            },
        };

        let Some(reference) = resolved else {
            errors.push(PricingError::DanglingDiscountReference {
                discount_index: index,
                tier: discount.price_tier_id.clone(),
            });
            continue;
        };

        discount.price_tier_id = reference.clone();
        let pair = (reference, discount.cutoff_date);
        if !pairs.insert(pair.clone()) && reported.insert(pair.clone()) {
            errors.push(PricingError::AmbiguousDiscount {
                tier: pair.0,
                cutoff_date: pair.1,
            });
        }
    }
}

/// Optional trimmed text; blank counts as missing.
fn parse_text(value: &Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(raw) => Ok(Some(raw.trim().to_string()).filter(|text| !text.is_empty())),
        Value::Number(number) => Ok(Some(number.to_string())),
        _ => Err("must be text".to_string()),
    }
}

fn parse_id(value: &Value) -> Result<Option<Uuid>, String> {
    match parse_text(value) {
        Ok(Some(raw)) => Uuid::parse_str(&raw)
            .map(Some)
            .map_err(|_| "must be a valid id".to_string()),
        Ok(None) => Ok(None),
        Err(_) => Err("must be a valid id".to_string()),
    }
}

/// Coerces a form amount (JSON number or numeric string) to a non-negative decimal.
pub(crate) fn parse_amount(value: &Value) -> Result<Decimal, String> {
    let text = match value {
        Value::Null => return Err("is required".to_string()),
        Value::Number(number) => number.to_string(),
        Value::String(raw) if raw.trim().is_empty() => return Err("is required".to_string()),
        Value::String(raw) => raw.trim().to_string(),
        _ => return Err("must be a number".to_string()),
    };

    let amount = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| "must be a number".to_string())?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err("must be zero or greater".to_string());
    }
    Ok(amount.normalize())
}

pub(crate) fn parse_order(value: &Value) -> Result<u32, String> {
    let order = match value {
        Value::Null => return Err("is required".to_string()),
        Value::Number(number) => match (number.as_i64(), number.as_f64()) {
            (Some(whole), _) => whole,
            (None, Some(float)) if float.fract() == 0.0 && float.abs() <= i64::MAX as f64 => {
                float as i64
            }
            _ => return Err("must be a whole number".to_string()),
        },
        Value::String(raw) if raw.trim().is_empty() => return Err("is required".to_string()),
        Value::String(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| "must be a whole number".to_string())?,
        _ => return Err("must be a whole number".to_string()),
    };

    if order < 0 {
        return Err("must be zero or greater".to_string());
    }
    i32::try_from(order)
        .map(|order| order as u32)
        .map_err(|_| "is too large".to_string())
}

/// Accepts a calendar date or an RFC 3339 timestamp (reduced to its UTC date).
pub(crate) fn parse_cutoff_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc).date_naive()))
        .map_err(|_| "must be a date (YYYY-MM-DD)".to_string())
}
