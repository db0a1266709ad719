use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    Json,
};
use tracing::warn;
use uuid::Uuid;

use super::{cookie::extract_session_token, dto::ApiResponse, jwt::JwtKeys};

/// Validates the session credential and yields the user ID it names.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, Json<ApiResponse>);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_session_token(&parts.headers).ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::failure("Unauthorized - no token provided")),
            )
        })?;

        let claims = JwtKeys::from_ref(state).verify(&token).map_err(|e| {
            warn!(error = %e, "invalid or expired session token");
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::failure("Unauthorized - invalid token")),
            )
        })?;

        Ok(AuthUser(claims.sub))
    }
}
