use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::forms::FormVariant;
use crate::models::Submission;
use crate::submission::mapper::NormalizedRecord;

pub async fn create(pool: &PgPool, record: &NormalizedRecord) -> Result<Submission, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        "INSERT INTO form_submissions (form_type, email_address, full_name, whatsapp_number, form_data)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(record.variant.id())
    .bind(&record.email_address)
    .bind(&record.full_name)
    .bind(&record.whatsapp_number)
    .bind(serde_json::Value::Object(record.form_data.clone()))
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>("SELECT * FROM form_submissions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortColumn {
    CreatedAt,
    EmailAddress,
    FullName,
    FormType,
}

impl SortColumn {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "email_address" => SortColumn::EmailAddress,
            "full_name" => SortColumn::FullName,
            "form_type" => SortColumn::FormType,
            _ => SortColumn::CreatedAt,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortColumn::CreatedAt => "created_at",
            SortColumn::EmailAddress => "email_address",
            SortColumn::FullName => "full_name",
            SortColumn::FormType => "form_type",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Row filter shared by `list` and `count`.
#[derive(Debug, Clone)]
pub struct Filter {
    pub form_type: FormVariant,
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub created_before: Option<DateTime<Utc>>,
    pub search: Option<String>,
}

pub struct ListParams {
    pub filter: Filter,
    pub limit: i64,
    pub offset: i64,
    pub sort_by: SortColumn,
    pub sort_order: SortOrder,
}

/// Escape `LIKE` wildcards so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    qb.push(" WHERE form_type = ").push_bind(filter.form_type.id());

    if let Some(from) = filter.created_from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(before) = filter.created_before {
        qb.push(" AND created_at < ").push_bind(before);
    }

    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", escape_like(search.trim()));
        qb.push(" AND (email_address ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR full_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR whatsapp_number ILIKE ")
            .push_bind(pattern.clone());
        if filter.form_type == FormVariant::CampusAmbassador {
            qb.push(" OR form_data->>'college' ILIKE ").push_bind(pattern);
        }
        qb.push(")");
    }
}

pub async fn list(pool: &PgPool, params: &ListParams) -> Result<Vec<Submission>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM form_submissions");
    push_filter(&mut qb, &params.filter);
    qb.push(format!(
        " ORDER BY {} {}, id LIMIT ",
        params.sort_by.as_sql(),
        params.sort_order.as_sql()
    ))
    .push_bind(params.limit)
    .push(" OFFSET ")
    .push_bind(params.offset);

    qb.build_query_as::<Submission>().fetch_all(pool).await
}

pub async fn count(pool: &PgPool, filter: &Filter) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM form_submissions");
    push_filter(&mut qb, filter);
    qb.build_query_scalar::<i64>().fetch_one(pool).await
}

/// Delete one submission. Returns the number of rows removed (0 or 1).
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM form_submissions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn count_by_form_type(pool: &PgPool) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as(
        "SELECT form_type, COUNT(*) FROM form_submissions GROUP BY form_type ORDER BY form_type",
    )
    .fetch_all(pool)
    .await
}
