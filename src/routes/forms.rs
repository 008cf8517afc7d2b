use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::forms::FormVariant;
use crate::state::SharedState;
use crate::submission::outcome::Outcome;
use crate::submission::pipeline::{self, PipelineError};
use crate::submission::{gate, parser};

pub async fn submit(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok());

    let raw = parser::parse_body(content_type, &body).map_err(AppError::BadRequest)?;

    let outcome = match pipeline::run(&state, raw).await {
        Ok(outcome) => outcome,
        Err(PipelineError::Invalid(msg)) => return Err(AppError::BadRequest(msg)),
        Err(PipelineError::Inactive(_)) => {
            return Ok((
                StatusCode::FORBIDDEN,
                Json(json!({
                    "success": false,
                    "error": "This form is currently not accepting submissions.",
                    "formInactive": true,
                })),
            )
                .into_response());
        }
    };

    match outcome {
        Outcome::Accepted(accepted) => Ok((StatusCode::OK, Json(accepted)).into_response()),
        Outcome::Failed(error) => Ok((
            StatusCode::BAD_GATEWAY,
            Json(json!({ "success": false, "error": error })),
        )
            .into_response()),
    }
}

#[derive(Deserialize)]
pub struct StatusParams {
    pub form_type: Option<String>,
}

pub async fn status(
    State(state): State<SharedState>,
    Query(params): Query<StatusParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let raw = params
        .form_type
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing form_type parameter".to_string()))?;
    let variant = FormVariant::parse(&raw)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown form type: {raw}")))?;

    let is_active = gate::is_accepting(&state.pool, variant).await;

    Ok(Json(json!({
        "success": true,
        "form_type": variant,
        "is_active": is_active,
    })))
}
