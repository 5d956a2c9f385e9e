use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::StoreError;
use crate::models::{PersistablePricing, PriceDiscountRow, PriceTierRow, PricingConfiguration};
use crate::pricing::PricingError;

pub async fn load_pricing_configuration(
    pool: &PgPool,
    convention_id: Uuid,
) -> Result<PricingConfiguration, sqlx::Error> {
    let tiers = sqlx::query_as::<_, PriceTierRow>(
        "SELECT id, convention_id, label, amount, display_order, position \
         FROM price_tiers WHERE convention_id = $1 \
         ORDER BY display_order, position",
    )
    .bind(convention_id)
    .fetch_all(pool)
    .await?;

    let discounts = sqlx::query_as::<_, PriceDiscountRow>(
        "SELECT id, convention_id, price_tier_id, cutoff_date, discounted_amount, position \
         FROM price_discounts WHERE convention_id = $1 \
         ORDER BY cutoff_date, position",
    )
    .bind(convention_id)
    .fetch_all(pool)
    .await?;

    debug!(
        %convention_id,
        tiers = tiers.len(),
        discounts = discounts.len(),
        "Loaded pricing configuration"
    );

    Ok(PersistablePricing { tiers, discounts }.into())
}

/// Replaces a convention's tiers and discounts in one transaction.
///
/// Dropping the transaction on an early `?` rolls everything back, so a
/// failed save leaves the previous configuration untouched. Ids already
/// stored under another convention are rejected before anything is written.
pub async fn save_pricing_configuration(
    pool: &PgPool,
    convention_id: Uuid,
    pricing: &PersistablePricing,
) -> Result<(), StoreError> {
    let mut tx = pool.begin().await?;

    let tier_ids: Vec<Uuid> = pricing.tiers.iter().map(|tier| tier.id).collect();
    let foreign_tiers: Vec<Uuid> = sqlx::query_scalar(
        "SELECT id FROM price_tiers WHERE id = ANY($1) AND convention_id <> $2",
    )
    .bind(&tier_ids)
    .bind(convention_id)
    .fetch_all(&mut *tx)
    .await?;
    if let Some(index) = tier_ids.iter().position(|id| foreign_tiers.contains(id)) {
        return Err(PricingError::tier(index, "id", "belongs to a different convention").into());
    }

    let discount_ids: Vec<Uuid> = pricing.discounts.iter().map(|d| d.id).collect();
    let foreign_discounts: Vec<Uuid> = sqlx::query_scalar(
        "SELECT id FROM price_discounts WHERE id = ANY($1) AND convention_id <> $2",
    )
    .bind(&discount_ids)
    .bind(convention_id)
    .fetch_all(&mut *tx)
    .await?;
    if let Some(index) = discount_ids
        .iter()
        .position(|id| foreign_discounts.contains(id))
    {
        return Err(
            PricingError::discount(index, "id", "belongs to a different convention").into(),
        );
    }

    sqlx::query("DELETE FROM price_discounts WHERE convention_id = $1")
        .bind(convention_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM price_tiers WHERE convention_id = $1")
        .bind(convention_id)
        .execute(&mut *tx)
        .await?;

    for tier in &pricing.tiers {
        sqlx::query(
            "INSERT INTO price_tiers (id, convention_id, label, amount, display_order, position) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(tier.id)
        .bind(convention_id)
        .bind(&tier.label)
        .bind(tier.amount)
        .bind(tier.display_order)
        .bind(tier.position)
        .execute(&mut *tx)
        .await?;
    }

    for discount in &pricing.discounts {
        sqlx::query(
            "INSERT INTO price_discounts \
             (id, convention_id, price_tier_id, cutoff_date, discounted_amount, position) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(discount.id)
        .bind(convention_id)
        .bind(discount.price_tier_id)
        .bind(discount.cutoff_date)
        .bind(discount.discounted_amount)
        .bind(discount.position)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("UPDATE conventions SET updated_at = now() WHERE id = $1")
        .bind(convention_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(
        %convention_id,
        tiers = pricing.tiers.len(),
        discounts = pricing.discounts.len(),
        "Saved pricing configuration"
    );

    Ok(())
}
