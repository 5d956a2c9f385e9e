use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

use super::error::PricingError;
use crate::models::{CurrencyCode, PriceDiscount, PriceTier, TierRef};

pub const REGULAR_PRICE_LABEL: &str = "Regular Price";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleColumn {
    /// Prices for purchases made before this date.
    Cutoff { date: NaiveDate },
    Regular,
}

impl ScheduleColumn {
    pub fn label(&self) -> String {
        match self {
            ScheduleColumn::Cutoff { date } => date.format("%Y-%m-%d").to_string(),
            ScheduleColumn::Regular => REGULAR_PRICE_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleCell {
    pub amount: Decimal,
    pub discounted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRow {
    pub tier_id: Option<Uuid>,
    pub label: String,
    pub cells: Vec<ScheduleCell>,
}

/// Tier × cutoff-date price table; the last column is always the regular price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplaySchedule {
    pub currency: CurrencyCode,
    pub columns: Vec<ScheduleColumn>,
    pub rows: Vec<ScheduleRow>,
}

pub fn build_display_schedule(
    tiers: &[PriceTier],
    discounts: &[PriceDiscount],
    currency: &CurrencyCode,
    as_of: NaiveDate,
) -> Result<DisplaySchedule, PricingError> {
    let mut pairs: HashSet<(TierRef, NaiveDate)> = HashSet::new();
    for discount in discounts {
        if !pairs.insert((discount.price_tier_id.clone(), discount.cutoff_date)) {
            return Err(PricingError::AmbiguousDiscount {
                tier: discount.price_tier_id.clone(),
                cutoff_date: discount.cutoff_date,
            });
        }
    }

    let cutoffs: BTreeSet<NaiveDate> = discounts
        .iter()
        .filter(|discount| discount.is_active_on(as_of))
        .map(|discount| discount.cutoff_date)
        .collect();

    let mut ordered: Vec<&PriceTier> = tiers.iter().collect();
    ordered.sort_by_key(|tier| tier.order);

    let rows = ordered
        .into_iter()
        .map(|tier| {
            let mut cells: Vec<ScheduleCell> = cutoffs
                .iter()
                .map(|cutoff| {
                    let discounted = discounts.iter().find(|discount| {
                        discount.cutoff_date == *cutoff && tier.is_referenced_by(discount)
                    });
                    match discounted {
                        Some(discount) => ScheduleCell {
                            amount: discount.discounted_amount,
                            discounted: true,
                        },
                        None => ScheduleCell {
                            amount: tier.amount,
                            discounted: false,
                        },
                    }
                })
                .collect();
            cells.push(ScheduleCell {
                amount: tier.amount,
                discounted: false,
            });

            ScheduleRow {
                tier_id: tier.id,
                label: tier.label.clone(),
                cells,
            }
        })
        .collect();

    let mut columns: Vec<ScheduleColumn> = cutoffs
        .into_iter()
        .map(|date| ScheduleColumn::Cutoff { date })
        .collect();
    columns.push(ScheduleColumn::Regular);

    Ok(DisplaySchedule {
        currency: currency.clone(),
        columns,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tier(key: &str, amount: i64, order: u32) -> PriceTier {
        PriceTier {
            id: None,
            convention_id: None,
            draft_key: Some(key.to_string()),
            label: key.to_string(),
            amount: Decimal::new(amount, 0),
            order,
        }
    }

    fn discount(key: &str, cutoff: NaiveDate, amount: i64) -> PriceDiscount {
        PriceDiscount {
            id: None,
            convention_id: None,
            cutoff_date: cutoff,
            price_tier_id: TierRef::from(key),
            discounted_amount: Decimal::new(amount, 0),
        }
    }

    fn amounts(schedule: &DisplaySchedule, row: usize) -> Vec<Decimal> {
        schedule.rows[row].cells.iter().map(|c| c.amount).collect()
    }

    #[test]
    fn test_adult_youth_schedule() {
        let tiers = vec![tier("Youth", 30, 1), tier("Adult", 60, 0)];
        let discounts = vec![discount("Adult", date(2025, 1, 1), 45)];

        let schedule =
            build_display_schedule(&tiers, &discounts, &CurrencyCode::usd(), date(2024, 10, 1))
                .unwrap();

        let labels: Vec<String> = schedule.columns.iter().map(ScheduleColumn::label).collect();
        assert_eq!(labels, vec!["2025-01-01", "Regular Price"]);
        assert_eq!(schedule.rows[0].label, "Adult");
        assert_eq!(schedule.rows[1].label, "Youth");
        assert_eq!(amounts(&schedule, 0), vec![Decimal::new(45, 0), Decimal::new(60, 0)]);
        assert_eq!(amounts(&schedule, 1), vec![Decimal::new(30, 0), Decimal::new(30, 0)]);
        assert!(schedule.rows[0].cells[0].discounted);
        assert!(!schedule.rows[1].cells[0].discounted);
    }

    #[test]
    fn test_shared_cutoff_is_one_column() {
        let tiers = vec![tier("Adult", 60, 0), tier("Youth", 30, 1)];
        let discounts = vec![
            discount("Adult", date(2025, 1, 1), 45),
            discount("Youth", date(2025, 1, 1), 20),
            discount("Adult", date(2025, 3, 1), 50),
        ];

        let schedule =
            build_display_schedule(&tiers, &discounts, &CurrencyCode::usd(), date(2024, 10, 1))
                .unwrap();

        assert_eq!(
            schedule.columns,
            vec![
                ScheduleColumn::Cutoff { date: date(2025, 1, 1) },
                ScheduleColumn::Cutoff { date: date(2025, 3, 1) },
                ScheduleColumn::Regular,
            ]
        );
        assert_eq!(
            amounts(&schedule, 1),
            vec![Decimal::new(20, 0), Decimal::new(30, 0), Decimal::new(30, 0)]
        );
    }

    #[test]
    fn test_past_cutoffs_dropped() {
        let tiers = vec![tier("Adult", 60, 0)];
        let discounts = vec![discount("Adult", date(2025, 1, 1), 45)];

        let schedule =
            build_display_schedule(&tiers, &discounts, &CurrencyCode::usd(), date(2025, 1, 1))
                .unwrap();
        assert_eq!(schedule.columns, vec![ScheduleColumn::Regular]);
        assert_eq!(amounts(&schedule, 0), vec![Decimal::new(60, 0)]);
    }

    #[test]
    fn test_no_discounts_only_regular_column() {
        let schedule = build_display_schedule(
            &[tier("Adult", 60, 0)],
            &[],
            &CurrencyCode::usd(),
            date(2024, 1, 1),
        )
        .unwrap();
        assert_eq!(schedule.columns.len(), 1);
        assert_eq!(schedule.rows.len(), 1);
    }

    #[test]
    fn test_equal_order_keeps_insertion_order() {
        let tiers = vec![tier("Student", 25, 2), tier("Adult", 60, 0), tier("Senior", 40, 2)];
        let schedule =
            build_display_schedule(&tiers, &[], &CurrencyCode::usd(), date(2024, 1, 1)).unwrap();
        let labels: Vec<&str> = schedule.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Adult", "Student", "Senior"]);
    }

    #[test]
    fn test_uuid_shaped_draft_key_gets_its_discount() {
        let key = "3f2b8c1e-9a4d-4e6f-8b2a-1c0d9e8f7a6b";
        let tiers = vec![tier(key, 60, 0)];
        let discounts = vec![discount(key, date(2025, 1, 1), 45)];

        let schedule =
            build_display_schedule(&tiers, &discounts, &CurrencyCode::usd(), date(2024, 10, 1))
                .unwrap();
        assert_eq!(amounts(&schedule, 0), vec![Decimal::new(45, 0), Decimal::new(60, 0)]);
        assert!(schedule.rows[0].cells[0].discounted);
    }

    #[test]
    fn test_duplicate_tier_cutoff_is_ambiguous() {
        let tiers = vec![tier("Adult", 60, 0)];
        let discounts = vec![
            discount("Adult", date(2025, 1, 1), 45),
            discount("Adult", date(2025, 1, 1), 40),
        ];
        let err = build_display_schedule(&tiers, &discounts, &CurrencyCode::usd(), date(2024, 1, 1))
            .unwrap_err();
        assert_eq!(
            err,
            PricingError::AmbiguousDiscount {
                tier: TierRef::from("Adult"),
                cutoff_date: date(2025, 1, 1),
            }
        );
    }
}
