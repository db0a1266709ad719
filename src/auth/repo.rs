use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User, UserProfile};

const USER_COLUMNS: &str = r#"
    id, email, password_hash, name, is_verified,
    verification_token, verification_token_expires_at,
    reset_password_token, reset_password_expires_at,
    last_login, created_at, updated_at
"#;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Persistence of user records.
///
/// Token lookups only return a user whose token matches AND whose expiry is
/// strictly after `now`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_profile(&self, id: Uuid) -> anyhow::Result<Option<UserProfile>>;
    async fn find_by_verification_token(
        &self,
        code: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>>;
    async fn find_by_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>>;
    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError>;
    /// Write every mutable column of `user` back and return the stored row.
    async fn save(&self, user: &User) -> anyhow::Result<User>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_profile(&self, id: Uuid) -> anyhow::Result<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, email, name, is_verified, last_login, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user profile")?;
        Ok(profile)
    }

    async fn find_by_verification_token(
        &self,
        code: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE verification_token = $1 AND verification_token_expires_at > $2
            "#
        ))
        .bind(code)
        .bind(now)
        .fetch_optional(&self.db)
        .await
        .context("find user by verification token")?;
        Ok(user)
    }

    async fn find_by_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE reset_password_token = $1 AND reset_password_expires_at > $2
            "#
        ))
        .bind(token)
        .bind(now)
        .fetch_optional(&self.db)
        .await
        .context("find user by reset token")?;
        Ok(user)
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, name, verification_token, verification_token_expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.name)
        .bind(&new_user.verification_token)
        .bind(new_user.verification_token_expires_at)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateEmail
            } else {
                StoreError::Other(anyhow::Error::new(e).context("insert user"))
            }
        })
    }

    async fn save(&self, user: &User) -> anyhow::Result<User> {
        let saved = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET password_hash = $2,
                   name = $3,
                   is_verified = $4,
                   verification_token = $5,
                   verification_token_expires_at = $6,
                   reset_password_token = $7,
                   reset_password_expires_at = $8,
                   last_login = $9,
                   updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.is_verified)
        .bind(&user.verification_token)
        .bind(user.verification_token_expires_at)
        .bind(&user.reset_password_token)
        .bind(user.reset_password_expires_at)
        .bind(user.last_login)
        .fetch_one(&self.db)
        .await
        .context("save user")?;
        Ok(saved)
    }
}
