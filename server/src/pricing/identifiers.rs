use std::collections::HashMap;
use uuid::Uuid;

use super::error::PricingError;
use crate::models::{
    PersistablePricing, PriceDiscountRow, PriceTierRow, PricingConfiguration, TierRef,
};

/// Gives every unsaved tier and discount an id and binds everything to
/// `convention_id`, rewriting draft-key references to the new tier ids.
///
/// Tiers keep their position in the submission so equal display orders
/// come back in the order they were entered.
pub fn assign_identifiers<F>(
    convention_id: Uuid,
    configuration: PricingConfiguration,
    mut next_id: F,
) -> Result<PersistablePricing, PricingError>
where
    F: FnMut() -> Uuid,
{
    if configuration.tiers.is_empty() {
        return Err(PricingError::EmptyTierList);
    }

    let mut draft_ids: HashMap<String, Uuid> = HashMap::new();
    let mut uuid_key_ids: HashMap<Uuid, Uuid> = HashMap::new();
    let mut tiers = Vec::with_capacity(configuration.tiers.len());

    for (index, tier) in configuration.tiers.into_iter().enumerate() {
        if tier.convention_id.is_some_and(|owner| owner != convention_id) {
            return Err(PricingError::tier(
                index,
                "convention_id",
                "belongs to a different convention",
            ));
        }

        let display_order = i32::try_from(tier.order)
            .map_err(|_| PricingError::tier(index, "order", "is too large"))?;

        let id = tier.id.unwrap_or_else(&mut next_id);
        if let Some(key) = tier.draft_key {
            if let Ok(parsed) = Uuid::parse_str(&key) {
                uuid_key_ids.insert(parsed, id);
            }
            draft_ids.insert(key, id);
        }

        tiers.push(PriceTierRow {
            id,
            convention_id,
            label: tier.label,
            amount: tier.amount,
            display_order,
            position: index as i32,
        });
    }

    let mut discounts = Vec::with_capacity(configuration.discounts.len());
    for (index, discount) in configuration.discounts.into_iter().enumerate() {
        if discount
            .convention_id
            .is_some_and(|owner| owner != convention_id)
        {
            return Err(PricingError::discount(
                index,
                "convention_id",
                "belongs to a different convention",
            ));
        }

        let tier_id = match &discount.price_tier_id {
            TierRef::Saved(id) if tiers.iter().any(|tier| tier.id == *id) => Some(*id),
            TierRef::Saved(id) => uuid_key_ids.get(id).copied(),
            TierRef::Draft(key) => draft_ids.get(key).copied(),
        };

        let Some(price_tier_id) = tier_id else {
            return Err(PricingError::DanglingDiscountReference {
                discount_index: index,
                tier: discount.price_tier_id,
            });
        };

        discounts.push(PriceDiscountRow {
            id: discount.id.unwrap_or_else(&mut next_id),
            convention_id,
            price_tier_id,
            cutoff_date: discount.cutoff_date,
            discounted_amount: discount.discounted_amount,
            position: index as i32,
        });
    }

    Ok(PersistablePricing { tiers, discounts })
}
