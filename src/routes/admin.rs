use std::collections::HashMap;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::extractor::AdminUser;
use crate::db;
use crate::db::submissions::{Filter, SortColumn, SortOrder};
use crate::error::AppError;
use crate::forms::FormVariant;
use crate::state::SharedState;

const NO_STORE: [(header::HeaderName, &str); 1] = [(
    header::CACHE_CONTROL,
    "no-store, no-cache, must-revalidate, proxy-revalidate",
)];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(rename = "form_type")]
    pub form_type: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
    pub search: Option<String>,
}

fn parse_variant(raw: Option<&str>) -> Result<FormVariant, AppError> {
    let raw = raw
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing form_type parameter".to_string()))?;
    FormVariant::parse(raw).ok_or_else(|| AppError::NotFound(format!("Unknown form type: {raw}")))
}

/// Parse a `YYYY-MM-DD` date or an RFC 3339 timestamp. With `end_of_day`,
/// a bare date becomes the following midnight so the whole day is included.
fn parse_bound(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, AppError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid date: {raw}")))?;
    let date = if end_of_day {
        date.checked_add_days(Days::new(1))
            .ok_or_else(|| AppError::BadRequest(format!("Invalid date: {raw}")))?
    } else {
        date
    };
    Ok(date.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// Rows to skip for a 1-based `page`.
fn page_offset(page: i64, page_size: i64) -> Result<i64, AppError> {
    (page - 1)
        .checked_mul(page_size)
        .ok_or_else(|| AppError::BadRequest("Invalid page".to_string()))
}

pub async fn list_submissions(
    admin: AdminUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let variant = parse_variant(params.form_type.as_deref())?;

    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(20).clamp(1, 100);
    let offset = page_offset(page, page_size)?;

    let filter = Filter {
        form_type: variant,
        created_from: params
            .start_date
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| parse_bound(s, false))
            .transpose()?,
        created_before: params
            .end_date
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| parse_bound(s, true))
            .transpose()?,
        search: params.search.clone().filter(|s| !s.trim().is_empty()),
    };

    let sort_by = SortColumn::parse(params.sort_field.as_deref().unwrap_or("created_at"));
    let sort_order = SortOrder::parse(params.sort_order.as_deref().unwrap_or("desc"));

    let list_params = db::submissions::ListParams {
        filter: filter.clone(),
        limit: page_size,
        offset,
        sort_by,
        sort_order,
    };

    let submissions: Vec<_> = db::submissions::list(&state.pool, &list_params)
        .await?
        .into_iter()
        .map(|s| s.with_folded_form_data())
        .collect();
    let total = db::submissions::count(&state.pool, &filter).await?;

    tracing::debug!("{} listed {} submissions", admin.email, submissions.len());

    Ok((
        NO_STORE,
        Json(json!({
            "success": true,
            "submissions": submissions,
            "pagination": {
                "total": total,
                "page": page,
                "pageSize": page_size,
                "totalPages": (total + page_size - 1) / page_size,
            },
            "filters": {
                "formType": variant,
                "startDate": params.start_date,
                "endDate": params.end_date,
                "searchTerm": filter.search,
            },
            "sorting": {
                "field": sort_by.as_sql(),
                "order": sort_order.as_sql().to_lowercase(),
            },
        })),
    ))
}

pub async fn list_forms(
    _admin: AdminUser,
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let counts: HashMap<String, i64> = db::submissions::count_by_form_type(&state.pool)
        .await?
        .into_iter()
        .collect();

    let statuses = match db::form_status::list(&state.pool).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!("Form status unavailable, assuming all forms active: {e}");
            Vec::new()
        }
    };

    let forms: Vec<_> = FormVariant::ALL
        .iter()
        .map(|variant| {
            let status = statuses.iter().find(|s| s.form_type == *variant);
            let schema = variant.schema();
            json!({
                "form_type": variant,
                "title": status.map(|s| s.title.as_str()).filter(|t| !t.is_empty()).unwrap_or(schema.title),
                "description": status.map(|s| s.description.as_str()).filter(|d| !d.is_empty()).unwrap_or(schema.description),
                "is_active": status.map(|s| s.is_active).unwrap_or(true),
                "submission_count": counts.get(variant.id()).copied().unwrap_or(0),
            })
        })
        .collect();

    Ok((NO_STORE, Json(json!({ "success": true, "forms": forms }))))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsParams {
    pub refresh: Option<bool>,
    pub date_range: Option<i32>,
}

pub async fn stats(
    _admin: AdminUser,
    State(state): State<SharedState>,
    Query(params): Query<StatsParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let refresh = params.refresh.unwrap_or(false);
    let date_range = params.date_range.unwrap_or(30).clamp(1, 365);
    let now = Utc::now();

    if !refresh {
        if let Some(cached) = state.stats_cache.get(date_range, now).await {
            tracing::debug!("Returning cached stats");
            return Ok(Json(json!({
                "success": true,
                "stats": cached,
                "fromCache": true,
            })));
        }
    }

    let fresh = crate::stats::compute(&state.pool, date_range).await?;
    state.stats_cache.put(fresh.clone(), now).await;

    Ok(Json(json!({
        "success": true,
        "stats": fresh,
        "fromCache": false,
        "refreshed": refresh,
    })))
}

#[derive(Deserialize)]
pub struct ToggleRequest {
    pub form_type: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn toggle_form_status(
    admin: AdminUser,
    State(state): State<SharedState>,
    Json(req): Json<ToggleRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let variant = parse_variant(req.form_type.as_deref())?;

    let status = match req.is_active {
        Some(is_active) => db::form_status::set_active(&state.pool, variant, is_active).await?,
        None => db::form_status::toggle(&state.pool, variant).await?,
    };

    tracing::info!(
        "{} set form {variant} {}",
        admin.email,
        if status.is_active { "active" } else { "inactive" }
    );

    Ok(Json(json!({
        "success": true,
        "message": format!(
            "Form '{variant}' status updated to {}",
            if status.is_active { "active" } else { "inactive" }
        ),
        "data": status,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    pub submission_id: Option<String>,
}

pub async fn delete_submission(
    admin: AdminUser,
    State(state): State<SharedState>,
    Json(req): Json<DeleteRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let raw = req
        .submission_id
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing submissionId parameter".to_string()))?;
    let id: Uuid = raw
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid submissionId: {raw}")))?;

    let deleted = db::submissions::delete(&state.pool, id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Submission not found".to_string()));
    }

    state.stats_cache.invalidate().await;
    tracing::info!("{} deleted submission {id}", admin.email);

    Ok(Json(json!({
        "success": true,
        "message": "Submission deleted successfully",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_date_includes_whole_day() {
        let end = parse_bound("2025-02-28", true).unwrap();
        assert_eq!(end.to_rfc3339(), "2025-03-01T00:00:00+00:00");
        let start = parse_bound("2025-02-28", false).unwrap();
        assert_eq!(start.to_rfc3339(), "2025-02-28T00:00:00+00:00");
    }

    #[test]
    fn timestamps_pass_through() {
        let ts = parse_bound("2025-02-28T12:30:00+02:00", true).unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-02-28T10:30:00+00:00");
        assert!(parse_bound("yesterday", false).is_err());
    }

    #[test]
    fn page_offset_rejects_overflow() {
        assert_eq!(page_offset(1, 20).unwrap(), 0);
        assert_eq!(page_offset(3, 25).unwrap(), 50);
        assert!(matches!(page_offset(i64::MAX, 100), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn variant_param_is_required_and_known() {
        assert!(matches!(parse_variant(None), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_variant(Some(" ")), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_variant(Some("poll")), Err(AppError::NotFound(_))));
        assert_eq!(parse_variant(Some("formx1")).unwrap(), FormVariant::General);
    }
}
