use sqlx::PgPool;

use crate::forms::FormVariant;
use crate::models::FormStatus;

pub async fn find(pool: &PgPool, variant: FormVariant) -> Result<Option<FormStatus>, sqlx::Error> {
    sqlx::query_as::<_, FormStatus>("SELECT * FROM form_status WHERE form_type = $1")
        .bind(variant.id())
        .fetch_optional(pool)
        .await
}

pub async fn list(pool: &PgPool) -> Result<Vec<FormStatus>, sqlx::Error> {
    sqlx::query_as::<_, FormStatus>("SELECT * FROM form_status ORDER BY form_type")
        .fetch_all(pool)
        .await
}

/// Create the active default row for a variant unless one already exists.
pub async fn insert_default(pool: &PgPool, variant: FormVariant) -> Result<(), sqlx::Error> {
    let schema = variant.schema();
    sqlx::query(
        "INSERT INTO form_status (form_type, is_active, title, description)
         VALUES ($1, true, $2, $3)
         ON CONFLICT (form_type) DO NOTHING",
    )
    .bind(variant.id())
    .bind(schema.title)
    .bind(schema.description)
    .execute(pool)
    .await?;
    Ok(())
}

/// Set the active flag, creating the row if needed. An existing title and
/// description are kept.
pub async fn set_active(
    pool: &PgPool,
    variant: FormVariant,
    is_active: bool,
) -> Result<FormStatus, sqlx::Error> {
    let schema = variant.schema();
    sqlx::query_as::<_, FormStatus>(
        "INSERT INTO form_status (form_type, is_active, title, description)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (form_type) DO UPDATE SET
            is_active = EXCLUDED.is_active,
            title = CASE WHEN form_status.title = '' THEN EXCLUDED.title ELSE form_status.title END,
            description = CASE WHEN form_status.description = '' THEN EXCLUDED.description ELSE form_status.description END,
            updated_at = now()
         RETURNING *",
    )
    .bind(variant.id())
    .bind(is_active)
    .bind(schema.title)
    .bind(schema.description)
    .fetch_one(pool)
    .await
}

/// Flip the active flag. A missing row counts as active, so the first flip
/// deactivates.
pub async fn toggle(pool: &PgPool, variant: FormVariant) -> Result<FormStatus, sqlx::Error> {
    let schema = variant.schema();
    sqlx::query_as::<_, FormStatus>(
        "INSERT INTO form_status (form_type, is_active, title, description)
         VALUES ($1, false, $2, $3)
         ON CONFLICT (form_type) DO UPDATE SET
            is_active = NOT form_status.is_active,
            updated_at = now()
         RETURNING *",
    )
    .bind(variant.id())
    .bind(schema.title)
    .bind(schema.description)
    .fetch_one(pool)
    .await
}
