use sqlx::PgPool;

use crate::models::CurrencyCode;

/// Shared by every handler through axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub default_currency: CurrencyCode,
}

impl AppState {
    pub fn new(pool: PgPool, default_currency: CurrencyCode) -> Self {
        Self {
            pool,
            default_currency,
        }
    }
}
