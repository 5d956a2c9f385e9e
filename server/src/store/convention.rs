use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Convention;

pub async fn load_convention(pool: &PgPool, id: Uuid) -> Result<Option<Convention>, sqlx::Error> {
    sqlx::query_as::<_, Convention>(
        "SELECT id, name, currency, created_at, updated_at FROM conventions WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}
