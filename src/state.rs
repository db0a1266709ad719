use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

use crate::auth::repo::{PgUserStore, UserStore};
use crate::config::AppConfig;
use crate::mail::{LogMailer, Mailer, SmtpMailer};

/// Everything a request handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Connects to the database and picks a mail transport.
    /// Returns the pool too so the caller can run migrations.
    pub async fn init(config: AppConfig) -> anyhow::Result<(Self, PgPool)> {
        let config = Arc::new(config);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let mailer: Arc<dyn Mailer> = match &config.mail.smtp {
            Some(smtp) => {
                info!(host = %smtp.host, port = smtp.port, "using smtp mailer");
                Arc::new(SmtpMailer::new(smtp, &config.mail)?)
            }
            None => {
                warn!("SMTP_HOST not set; emails will only be logged");
                Arc::new(LogMailer)
            }
        };

        let users = Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>;
        Ok((Self::from_parts(config, users, mailer), db))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            config,
            users,
            mailer,
        }
    }
}
