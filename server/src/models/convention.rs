use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::currency::CurrencyCode;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Convention {
    pub id: Uuid,
    pub name: String,
    pub currency: CurrencyCode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
