use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{CurrencyCode, PriceDiscount, PriceTier};

/// Price a tier costs on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectivePrice {
    pub amount: Decimal,
    pub currency: CurrencyCode,
    /// Cutoff of the discount that applies, `None` at the regular price.
    pub discount_cutoff: Option<NaiveDate>,
}

impl EffectivePrice {
    pub fn is_discounted(&self) -> bool {
        self.discount_cutoff.is_some()
    }
}

/// The discount in force for `tier` on `as_of`: the one with the soonest
/// cutoff still after `as_of`. Equal cutoffs settle on the lower amount.
pub fn active_discount<'a>(
    tier: &PriceTier,
    discounts: &'a [PriceDiscount],
    as_of: NaiveDate,
) -> Option<&'a PriceDiscount> {
    discounts
        .iter()
        .filter(|discount| tier.is_referenced_by(discount) && discount.is_active_on(as_of))
        .min_by(|a, b| {
            a.cutoff_date
                .cmp(&b.cutoff_date)
                .then(a.discounted_amount.cmp(&b.discounted_amount))
        })
}

pub fn resolve_effective_price(
    tier: &PriceTier,
    discounts: &[PriceDiscount],
    currency: &CurrencyCode,
    as_of: NaiveDate,
) -> EffectivePrice {
    match active_discount(tier, discounts, as_of) {
        Some(discount) => EffectivePrice {
            amount: discount.discounted_amount,
            currency: currency.clone(),
            discount_cutoff: Some(discount.cutoff_date),
        },
        None => EffectivePrice {
            amount: tier.amount,
            currency: currency.clone(),
            discount_cutoff: None,
        },
    }
}

/// [`resolve_effective_price`] as of the current UTC date.
pub fn resolve_effective_price_today(
    tier: &PriceTier,
    discounts: &[PriceDiscount],
    currency: &CurrencyCode,
) -> EffectivePrice {
    resolve_effective_price(tier, discounts, currency, Utc::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TierRef;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn adult(id: Uuid) -> PriceTier {
        PriceTier {
            id: Some(id),
            convention_id: None,
            draft_key: None,
            label: "Adult".to_string(),
            amount: Decimal::new(60, 0),
            order: 0,
        }
    }

    fn discount(tier: Uuid, cutoff: NaiveDate, amount: i64) -> PriceDiscount {
        PriceDiscount {
            id: None,
            convention_id: None,
            cutoff_date: cutoff,
            price_tier_id: TierRef::Saved(tier),
            discounted_amount: Decimal::new(amount, 0),
        }
    }

    fn early_bird(id: Uuid) -> Vec<PriceDiscount> {
        vec![
            discount(id, date(2025, 3, 1), 45),
            discount(id, date(2025, 1, 1), 40),
        ]
    }

    #[test]
    fn test_soonest_future_cutoff_wins() {
        let id = Uuid::new_v4();
        let price =
            resolve_effective_price(&adult(id), &early_bird(id), &CurrencyCode::usd(), date(2024, 12, 1));
        assert_eq!(price.amount, Decimal::new(40, 0));
        assert_eq!(price.discount_cutoff, Some(date(2025, 1, 1)));
        assert_eq!(price.currency.as_str(), "USD");
    }

    #[test]
    fn test_expired_discounts_ignored() {
        let id = Uuid::new_v4();
        let price =
            resolve_effective_price(&adult(id), &early_bird(id), &CurrencyCode::usd(), date(2025, 2, 1));
        assert_eq!(price.amount, Decimal::new(45, 0));
    }

    #[test]
    fn test_discount_expires_on_cutoff_date() {
        let id = Uuid::new_v4();
        let price =
            resolve_effective_price(&adult(id), &early_bird(id), &CurrencyCode::usd(), date(2025, 1, 1));
        assert_eq!(price.amount, Decimal::new(45, 0));

        let price =
            resolve_effective_price(&adult(id), &early_bird(id), &CurrencyCode::usd(), date(2025, 3, 1));
        assert_eq!(price.amount, Decimal::new(60, 0));
        assert!(!price.is_discounted());
    }

    #[test]
    fn test_regular_price_without_discounts() {
        let id = Uuid::new_v4();
        for as_of in [date(2000, 1, 1), date(2025, 6, 1), date(2100, 12, 31)] {
            let price = resolve_effective_price(&adult(id), &[], &CurrencyCode::usd(), as_of);
            assert_eq!(price.amount, Decimal::new(60, 0));
            assert_eq!(price.discount_cutoff, None);
        }
    }

    #[test]
    fn test_other_tiers_discounts_do_not_apply() {
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();
        let price = resolve_effective_price(
            &adult(id),
            &early_bird(other),
            &CurrencyCode::usd(),
            date(2024, 12, 1),
        );
        assert_eq!(price.amount, Decimal::new(60, 0));
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let id = Uuid::new_v4();
        let tier = adult(id);
        let discounts = early_bird(id);
        let first = resolve_effective_price(&tier, &discounts, &CurrencyCode::usd(), date(2024, 12, 1));
        let second = resolve_effective_price(&tier, &discounts, &CurrencyCode::usd(), date(2024, 12, 1));
        assert_eq!(first, second);
    }

    #[test]
    fn test_equal_cutoffs_pick_lower_amount() {
        let id = Uuid::new_v4();
        let discounts = vec![
            discount(id, date(2025, 1, 1), 42),
            discount(id, date(2025, 1, 1), 38),
        ];
        let price =
            resolve_effective_price(&adult(id), &discounts, &CurrencyCode::usd(), date(2024, 12, 1));
        assert_eq!(price.amount, Decimal::new(38, 0));
    }
}
