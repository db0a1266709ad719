use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// SMTP transport settings. Absent when `SMTP_HOST` is unset.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub from_email: String,
    pub from_name: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    /// Base URL of the front-end; used for reset links and as the CORS origin.
    pub client_url: String,
    pub production: bool,
    pub static_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "authflow".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "authflow-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 7),
        };

        let smtp = match std::env::var("SMTP_HOST") {
            Ok(host) if !host.trim().is_empty() => Some(SmtpConfig {
                host,
                port: std::env::var("SMTP_PORT")
                    .ok()
                    .and_then(|v| v.parse::<u16>().ok())
                    .unwrap_or(587),
                username: std::env::var("SMTP_USERNAME").ok(),
                password: std::env::var("SMTP_PASSWORD").ok(),
                tls: std::env::var("SMTP_TLS")
                    .map(|v| v != "false" && v != "0")
                    .unwrap_or(true),
            }),
            _ => None,
        };
        let mail = MailConfig {
            from_email: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@authflow.local".into()),
            from_name: std::env::var("MAIL_FROM_NAME").unwrap_or_else(|_| "Authflow".into()),
            smtp,
        };

        let client_url = std::env::var("CLIENT_URL")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .trim_end_matches('/')
            .to_string();
        let production = std::env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);
        let static_dir = std::env::var("STATIC_DIR").ok().map(PathBuf::from);

        Ok(Self {
            database_url,
            jwt,
            mail,
            client_url,
            production,
            static_dir,
        })
    }

    /// Session lifetime in seconds, shared by the JWT `exp` and the cookie `Max-Age`.
    pub fn session_ttl_seconds(&self) -> i64 {
        self.jwt.ttl_minutes * 60
    }
}
