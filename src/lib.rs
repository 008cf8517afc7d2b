pub mod config;
pub mod error;
pub mod state;
pub mod auth;
pub mod db;
pub mod forms;
pub mod models;
pub mod routes;
pub mod sheets;
pub mod stats;
pub mod submission;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method};
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::sheets::{HttpSheetSink, SheetSink, UnconfiguredSink};
use crate::state::{AppState, SharedState};
use crate::stats::StatsCache;

pub fn build_app(pool: PgPool, config: Config) -> Router {
    let sheets: Arc<dyn SheetSink> = match config.sheets.as_ref() {
        Some(sheets_config) => match HttpSheetSink::new(sheets_config) {
            Ok(sink) => {
                tracing::info!("Spreadsheet sink configured");
                Arc::new(sink)
            }
            Err(e) => {
                tracing::warn!("Spreadsheet sink not available: {e}");
                Arc::new(UnconfiguredSink)
            }
        },
        None => {
            tracing::warn!("FORMIFY_SHEETS_URL not set, submissions are stored in the database only");
            Arc::new(UnconfiguredSink)
        }
    };

    let cors = cors_layer(&config.cors_origins);
    let max_body_size = config.max_body_size;

    let state: SharedState = Arc::new(AppState {
        pool,
        stats_cache: StatsCache::new(config.stats_ttl),
        config,
        sheets,
    });

    Router::new()
        .merge(routes::public_routes().layer(cors))
        .merge(routes::admin_routes())
        .route("/health", axum::routing::get(health))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

/// The public form endpoints are called from browser pages, possibly on
/// another origin. An empty origin list allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin '{o}'");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE])
}

async fn health() -> &'static str {
    "ok"
}
