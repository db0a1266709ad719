use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use super::Mailer;
use crate::config::{MailConfig, SmtpConfig};

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(smtp: &SmtpConfig, mail: &MailConfig) -> anyhow::Result<Self> {
        let mut builder = if smtp.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
                .with_context(|| format!("smtp relay {}", smtp.host))?
        } else {
            // Local catchers (Mailpit, MailHog) speak plain SMTP.
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
        };
        builder = builder.port(smtp.port);
        if let (Some(user), Some(pass)) = (&smtp.username, &smtp.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let from = format!("{} <{}>", mail.from_name, mail.from_email)
            .parse::<Mailbox>()
            .context("parse MAIL_FROM")?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(to.parse::<Mailbox>().context("parse recipient")?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .context("build message")?;

        self.transport.send(email).await.context("smtp send")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_smtp() -> SmtpConfig {
        SmtpConfig {
            host: "localhost".into(),
            port: 1025,
            username: None,
            password: None,
            tls: false,
        }
    }

    fn mail(from_email: &str) -> MailConfig {
        MailConfig {
            from_email: from_email.into(),
            from_name: "Authflow".into(),
            smtp: None,
        }
    }

    #[tokio::test]
    async fn builds_for_local_catcher() {
        assert!(SmtpMailer::new(&local_smtp(), &mail("no-reply@authflow.local")).is_ok());
    }

    #[tokio::test]
    async fn rejects_invalid_sender() {
        assert!(SmtpMailer::new(&local_smtp(), &mail("not-an-address")).is_err());
    }

    #[tokio::test]
    async fn rejects_invalid_recipient_before_connecting() {
        let mailer = SmtpMailer::new(&local_smtp(), &mail("no-reply@authflow.local")).unwrap();
        let err = mailer.send("not-an-email", "s", "<p>b</p>").await.unwrap_err();
        assert!(err.to_string().contains("parse recipient"));
    }
}
