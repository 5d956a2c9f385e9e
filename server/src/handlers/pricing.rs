use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::{Convention, CurrencyCode, PricingConfiguration, PricingDraft};
use crate::pricing::{
    assign_identifiers, build_display_schedule, resolve_effective_price,
    resolve_effective_price_today, validate_configuration,
};
use crate::state::AppState;
use crate::store::{load_convention, load_pricing_configuration, save_pricing_configuration};
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Debug, Default, Deserialize)]
pub struct AsOfQuery {
    pub as_of: Option<NaiveDate>,
}

impl AsOfQuery {
    fn date(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Utc::now().date_naive())
    }
}

/// Unsaved pricing from the editor, rendered before it is stored.
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(flatten)]
    pub draft: PricingDraft,
    #[serde(default)]
    pub currency: Option<CurrencyCode>,
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct PricingPayload {
    pub convention_id: Uuid,
    pub currency: CurrencyCode,
    #[serde(flatten)]
    pub configuration: PricingConfiguration,
}

async fn require_convention(pool: &PgPool, convention_id: Uuid) -> Result<Convention, AppError> {
    load_convention(pool, convention_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Convention '{}' was not found", convention_id)))
}

pub async fn validate_pricing(
    body: Result<Json<PricingDraft>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(draft) = body?;
    let configuration = validate_configuration(&draft.tiers, &draft.discounts)?;
    Ok(success(configuration, "Pricing configuration is valid"))
}

pub async fn preview_schedule(
    State(state): State<AppState>,
    body: Result<Json<PreviewRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = body?;
    let configuration = validate_configuration(&request.draft.tiers, &request.draft.discounts)?;
    let currency = request.currency.unwrap_or(state.default_currency);
    let as_of = AsOfQuery { as_of: request.as_of }.date();

    let schedule = build_display_schedule(
        &configuration.tiers,
        &configuration.discounts,
        &currency,
        as_of,
    )?;
    Ok(success(schedule, "Pricing schedule preview"))
}

pub async fn get_pricing(
    State(state): State<AppState>,
    Path(convention_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let convention = require_convention(&state.pool, convention_id).await?;
    let configuration = load_pricing_configuration(&state.pool, convention_id).await?;

    let payload = PricingPayload {
        convention_id,
        currency: convention.currency,
        configuration,
    };
    Ok(success(payload, "Pricing configuration loaded"))
}

pub async fn save_pricing(
    State(state): State<AppState>,
    Path(convention_id): Path<Uuid>,
    body: Result<Json<PricingDraft>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(draft) = body?;
    let convention = require_convention(&state.pool, convention_id).await?;

    let configuration = validate_configuration(&draft.tiers, &draft.discounts)?;
    let pricing = assign_identifiers(convention_id, configuration, Uuid::new_v4)?;
    save_pricing_configuration(&state.pool, convention_id, &pricing).await?;

    info!(
        %convention_id,
        convention = %convention.name,
        "Pricing configuration updated"
    );

    let payload = PricingPayload {
        convention_id,
        currency: convention.currency,
        configuration: pricing.into(),
    };
    Ok(success(payload, "Pricing configuration saved"))
}

pub async fn get_schedule(
    State(state): State<AppState>,
    Path(convention_id): Path<Uuid>,
    query: Result<Query<AsOfQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    let convention = require_convention(&state.pool, convention_id).await?;
    let configuration = load_pricing_configuration(&state.pool, convention_id).await?;

    let schedule = build_display_schedule(
        &configuration.tiers,
        &configuration.discounts,
        &convention.currency,
        query.date(),
    )?;
    Ok(success(schedule, "Pricing schedule loaded"))
}

pub async fn get_tier_price(
    State(state): State<AppState>,
    Path((convention_id, tier_id)): Path<(Uuid, Uuid)>,
    query: Result<Query<AsOfQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    let convention = require_convention(&state.pool, convention_id).await?;
    let configuration = load_pricing_configuration(&state.pool, convention_id).await?;

    let tier = configuration
        .tiers
        .iter()
        .find(|tier| tier.id == Some(tier_id))
        .ok_or_else(|| AppError::NotFound(format!("Price tier '{}' was not found", tier_id)))?;

    let price = match query.as_of {
        Some(as_of) => {
            resolve_effective_price(tier, &configuration.discounts, &convention.currency, as_of)
        }
        None => resolve_effective_price_today(tier, &configuration.discounts, &convention.currency),
    };
    Ok(success(price, "Effective price resolved"))
}
