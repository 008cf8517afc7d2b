use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use crate::auth::jwt;
use crate::error::AppError;
use crate::state::SharedState;

/// An authenticated administrator: a valid provider token whose email is on
/// the configured admin list.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub subject: String,
    pub email: String,
}

impl FromRequestParts<SharedState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized("Missing authentication token".to_string()))?;

        let claims = jwt::decode_token(bearer.token(), &state.config.jwt_secret)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        if !state.config.is_admin_email(&claims.email) {
            tracing::warn!("Rejected admin request from {}", claims.email);
            return Err(AppError::Forbidden("Not an authorized admin".to_string()));
        }

        Ok(AdminUser {
            subject: claims.sub,
            email: claims.email,
        })
    }
}
