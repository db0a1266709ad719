use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;

use crate::{
    auth::{
        cookie::{clear_session_cookie, session_cookie},
        dto::{
            ApiResponse, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest,
            SanitizedUser, SignupRequest, VerifyEmailRequest,
        },
        error::AuthError,
        extractors::AuthUser,
        services::{self, Session},
    },
    state::AppState,
};

type Reply = Result<(StatusCode, HeaderMap, Json<ApiResponse>), AuthError>;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/verify-email", post(verify_email))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password/:token", post(reset_password))
        .route("/check-auth", get(check_auth))
}

fn with_session_cookie(state: &AppState, session: &Session) -> Result<HeaderMap, AuthError> {
    let cookie = session_cookie(
        &session.token,
        state.config.session_ttl_seconds(),
        state.config.production,
    )
    .context("build session cookie")?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    Ok(headers)
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Reply {
    let Json(payload) = payload?;
    let input = payload.validate()?;
    let session = services::signup(&state, input, OffsetDateTime::now_utc()).await?;
    let headers = with_session_cookie(&state, &session)?;
    Ok((
        StatusCode::CREATED,
        headers,
        Json(ApiResponse::with_user(
            "User created successfully",
            SanitizedUser::from(&session.user),
        )),
    ))
}

#[instrument(skip(state, payload))]
pub async fn verify_email(
    State(state): State<AppState>,
    payload: Result<Json<VerifyEmailRequest>, JsonRejection>,
) -> Reply {
    let Json(payload) = payload?;
    let user = services::verify_email(&state, payload.code(), OffsetDateTime::now_utc()).await?;
    Ok((
        StatusCode::OK,
        HeaderMap::new(),
        Json(ApiResponse::with_user(
            "Email verified successfully",
            SanitizedUser::from(&user),
        )),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Reply {
    let Json(payload) = payload?;
    let input = payload.validate()?;
    let session = services::login(&state, input, OffsetDateTime::now_utc()).await?;
    let headers = with_session_cookie(&state, &session)?;
    Ok((
        StatusCode::OK,
        headers,
        Json(ApiResponse::with_user(
            "Logged in successfully",
            SanitizedUser::from(&session.user),
        )),
    ))
}

#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> (StatusCode, HeaderMap, Json<ApiResponse>) {
    let mut headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(state.config.production) {
        headers.insert(SET_COOKIE, cookie);
    }
    (
        StatusCode::OK,
        headers,
        Json(ApiResponse::ok("Logged out successfully")),
    )
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    payload: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> Reply {
    let Json(payload) = payload?;
    let email = payload.validate()?;
    services::forgot_password(&state, &email, OffsetDateTime::now_utc()).await?;
    Ok((
        StatusCode::OK,
        HeaderMap::new(),
        Json(ApiResponse::ok("Password reset link sent to your email")),
    ))
}

#[instrument(skip(state, token, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Reply {
    let Json(payload) = payload?;
    let password = payload.validate()?;
    services::reset_password(&state, &token, &password, OffsetDateTime::now_utc()).await?;
    Ok((
        StatusCode::OK,
        HeaderMap::new(),
        Json(ApiResponse::ok("Password reset successful")),
    ))
}

#[instrument(skip(state))]
pub async fn check_auth(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Reply {
    let profile = services::check_auth(&state, user_id).await?;
    Ok((
        StatusCode::OK,
        HeaderMap::new(),
        Json(ApiResponse::with_user(
            "User authenticated",
            SanitizedUser::from(profile),
        )),
    ))
}
