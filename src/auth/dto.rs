use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::{
    error::AuthError,
    repo_types::{User, UserProfile},
};

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// A field counts as present only when it is non-blank.
fn present(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.trim().is_empty())
}

/// Accepts the verification code as a JSON string or unsigned integer.
/// Any other shape reads as absent, so it fails like an unknown code.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => n.as_u64().map(|n| n.to_string()),
        _ => None,
    })
}

// ---- requests ----

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VerifyEmailRequest {
    #[serde(deserialize_with = "string_or_number")]
    pub code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResetPasswordRequest {
    pub password: Option<String>,
}

// ---- validated inputs ----

#[derive(Debug, Clone)]
pub struct Signup {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl SignupRequest {
    pub fn validate(self) -> Result<Signup, AuthError> {
        let (Some(email), Some(password), Some(name)) =
            (present(self.email), present(self.password), present(self.name))
        else {
            return Err(AuthError::missing_fields());
        };
        let email = email.trim().to_string();
        if !is_valid_email(&email) {
            return Err(AuthError::Validation("Invalid email".into()));
        }
        Ok(Signup {
            email,
            password,
            name: name.trim().to_string(),
        })
    }
}

impl LoginRequest {
    pub fn validate(self) -> Result<Credentials, AuthError> {
        let (Some(email), Some(password)) = (present(self.email), present(self.password)) else {
            return Err(AuthError::missing_fields());
        };
        Ok(Credentials {
            email: email.trim().to_string(),
            password,
        })
    }
}

impl VerifyEmailRequest {
    /// `None` when no usable code was supplied.
    pub fn code(self) -> Option<String> {
        present(self.code).map(|c| c.trim().to_string())
    }
}

impl ForgotPasswordRequest {
    pub fn validate(self) -> Result<String, AuthError> {
        present(self.email)
            .map(|e| e.trim().to_string())
            .ok_or_else(AuthError::missing_fields)
    }
}

impl ResetPasswordRequest {
    pub fn validate(self) -> Result<String, AuthError> {
        present(self.password).ok_or_else(|| AuthError::Validation("Password is required".into()))
    }
}

// ---- responses ----

/// Public view of a user. Built explicitly; has no password or token fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub is_verified: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&User> for SanitizedUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            name: u.name.clone(),
            is_verified: u.is_verified,
            last_login: u.last_login,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

impl From<UserProfile> for SanitizedUser {
    fn from(p: UserProfile) -> Self {
        Self {
            id: p.id,
            email: p.email,
            name: p.name,
            is_verified: p.is_verified,
            last_login: p.last_login,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Envelope returned by every auth endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SanitizedUser>,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            user: None,
        }
    }

    pub fn with_user(message: impl Into<String>, user: SanitizedUser) -> Self {
        Self {
            success: true,
            message: message.into(),
            user: Some(user),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            user: None,
        }
    }
}
