pub mod admin;
pub mod forms;

use axum::Router;
use axum::routing::{get, post};

use crate::state::SharedState;

pub fn public_routes() -> Router<SharedState> {
    Router::new()
        .route("/api/submit-form", post(forms::submit))
        .route("/api/form-status", get(forms::status))
}

pub fn admin_routes() -> Router<SharedState> {
    Router::new()
        .route("/api/admin/submissions", get(admin::list_submissions))
        .route("/api/admin/forms", get(admin::list_forms))
        .route("/api/admin/stats", get(admin::stats))
        .route("/api/admin/toggle-form-status", post(admin::toggle_form_status))
        .route("/api/admin/delete-submission", post(admin::delete_submission))
}
