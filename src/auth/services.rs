//! The authentication workflow.
//!
//! Each operation takes already-validated input plus the current time and
//! performs at most one lookup and one write against the user store.

use axum::extract::FromRef;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{Credentials, Signup},
        error::{AuthError, TokenPurpose},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::StoreError,
        repo_types::{NewUser, User, UserProfile},
        tokens,
    },
    mail::{self, Notification},
    state::AppState,
};

/// A user together with a freshly signed session credential.
#[derive(Debug)]
pub struct Session {
    pub user: User,
    pub token: String,
}

fn notify(state: &AppState, to: &str, notification: Notification) {
    mail::dispatch(state.mailer.clone(), to.to_string(), notification);
}

fn sign_session(state: &AppState, user: User) -> Result<Session, AuthError> {
    let token = JwtKeys::from_ref(state).sign(user.id)?;
    Ok(Session { user, token })
}

pub async fn signup(
    state: &AppState,
    input: Signup,
    now: OffsetDateTime,
) -> Result<Session, AuthError> {
    if state.users.find_by_email(&input.email).await?.is_some() {
        warn!(email = %input.email, "signup for registered email");
        return Err(AuthError::Conflict);
    }

    let password_hash = hash_password(&input.password)?;
    let code = tokens::verification_code();
    let new_user = NewUser {
        email: input.email,
        password_hash,
        name: input.name,
        verification_token: code.clone(),
        verification_token_expires_at: now + tokens::VERIFICATION_TTL,
    };

    let user = match state.users.insert(new_user).await {
        Ok(u) => u,
        Err(StoreError::DuplicateEmail) => {
            warn!("signup lost a race on the email unique constraint");
            return Err(AuthError::Conflict);
        }
        Err(StoreError::Other(e)) => return Err(AuthError::Internal(e)),
    };

    let session = sign_session(state, user)?;
    notify(state, &session.user.email, Notification::Verification { code });

    info!(user_id = %session.user.id, email = %session.user.email, "user signed up");
    Ok(session)
}

pub async fn verify_email(
    state: &AppState,
    code: Option<String>,
    now: OffsetDateTime,
) -> Result<User, AuthError> {
    let invalid = || AuthError::InvalidToken(TokenPurpose::Verification);
    let code = code.ok_or_else(invalid)?;

    let mut user = state
        .users
        .find_by_verification_token(&code, now)
        .await?
        .filter(|u| tokens::is_live(u.verification_token_expires_at, now))
        .ok_or_else(|| {
            warn!("invalid or expired verification code");
            invalid()
        })?;

    user.is_verified = true;
    user.verification_token = None;
    user.verification_token_expires_at = None;
    let user = state.users.save(&user).await?;

    notify(
        state,
        &user.email,
        Notification::Welcome {
            name: user.name.clone(),
        },
    );

    info!(user_id = %user.id, "email verified");
    Ok(user)
}

pub async fn login(
    state: &AppState,
    input: Credentials,
    now: OffsetDateTime,
) -> Result<Session, AuthError> {
    let Some(mut user) = state.users.find_by_email(&input.email).await? else {
        warn!(email = %input.email, "login unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_password(&input.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    user.last_login = Some(now);
    let user = state.users.save(&user).await?;

    info!(user_id = %user.id, "user logged in");
    sign_session(state, user)
}

pub async fn forgot_password(
    state: &AppState,
    email: &str,
    now: OffsetDateTime,
) -> Result<(), AuthError> {
    let Some(mut user) = state.users.find_by_email(email).await? else {
        warn!(email = %email, "password reset for unknown email");
        return Err(AuthError::NotFound("Invalid email"));
    };

    let token = tokens::reset_token();
    user.reset_password_token = Some(token.clone());
    user.reset_password_expires_at = Some(now + tokens::RESET_TTL);
    let user = state.users.save(&user).await?;

    let url = format!("{}/reset-password/{}", state.config.client_url, token);
    notify(state, &user.email, Notification::PasswordReset { url });

    info!(user_id = %user.id, "password reset requested");
    Ok(())
}

pub async fn reset_password(
    state: &AppState,
    token: &str,
    new_password: &str,
    now: OffsetDateTime,
) -> Result<(), AuthError> {
    let mut user = state
        .users
        .find_by_reset_token(token, now)
        .await?
        .filter(|u| tokens::is_live(u.reset_password_expires_at, now))
        .ok_or_else(|| {
            warn!("invalid or expired reset token");
            AuthError::InvalidToken(TokenPurpose::Reset)
        })?;

    user.password_hash = hash_password(new_password)?;
    user.reset_password_token = None;
    user.reset_password_expires_at = None;
    let user = state.users.save(&user).await?;

    notify(state, &user.email, Notification::ResetSuccess);

    info!(user_id = %user.id, "password reset");
    Ok(())
}

pub async fn check_auth(state: &AppState, user_id: Uuid) -> Result<UserProfile, AuthError> {
    state.users.find_profile(user_id).await?.ok_or_else(|| {
        warn!(%user_id, "session for missing user");
        AuthError::NotFound("User not found")
    })
}
