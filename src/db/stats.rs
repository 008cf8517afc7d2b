use chrono::NaiveDate;
use sqlx::PgPool;

pub async fn total(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM form_submissions")
        .fetch_one(pool)
        .await
}

pub async fn by_occupation(pool: &PgPool) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as(
        "SELECT COALESCE(form_data->>'occupation', occupation, 'unknown') AS occupation, COUNT(*)
         FROM form_submissions
         GROUP BY 1
         ORDER BY 1",
    )
    .fetch_all(pool)
    .await
}

/// Submissions per calendar day (UTC) over the last `days` days.
pub async fn by_date(pool: &PgPool, days: i32) -> Result<Vec<(NaiveDate, i64)>, sqlx::Error> {
    sqlx::query_as(
        "SELECT (created_at AT TIME ZONE 'UTC')::date AS day, COUNT(*)
         FROM form_submissions
         WHERE created_at > now() - make_interval(days => $1)
         GROUP BY 1
         ORDER BY 1 DESC",
    )
    .bind(days)
    .fetch_all(pool)
    .await
}
