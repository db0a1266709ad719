//! Transactional email.
//!
//! Every notification is dispatched on its own task; the request that
//! triggered it never waits for delivery and never sees a delivery error.

mod smtp;
mod templates;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, error};

pub use smtp::SmtpMailer;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()>;
}

/// Events the auth workflow emails users about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Verification { code: String },
    Welcome { name: String },
    PasswordReset { url: String },
    ResetSuccess,
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::Verification { .. } => "verification",
            Notification::Welcome { .. } => "welcome",
            Notification::PasswordReset { .. } => "password_reset",
            Notification::ResetSuccess => "reset_success",
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            Notification::Verification { .. } => "Verify your email",
            Notification::Welcome { .. } => "Welcome aboard",
            Notification::PasswordReset { .. } => "Reset your password",
            Notification::ResetSuccess => "Password reset successful",
        }
    }

    pub fn render(&self) -> String {
        match self {
            Notification::Verification { code } => templates::verification(code),
            Notification::Welcome { name } => templates::welcome(name),
            Notification::PasswordReset { url } => templates::password_reset(url),
            Notification::ResetSuccess => templates::reset_success(),
        }
    }
}

/// Send `notification` to `to` in the background, logging the outcome.
pub fn dispatch(mailer: Arc<dyn Mailer>, to: String, notification: Notification) -> JoinHandle<()> {
    tokio::spawn(async move {
        let kind = notification.kind();
        match mailer
            .send(&to, notification.subject(), &notification.render())
            .await
        {
            Ok(()) => debug!(to = %to, kind, "email sent"),
            Err(e) => error!(error = ?e, to = %to, kind, "failed to send email"),
        }
    })
}

/// Used when no SMTP relay is configured: writes the message to the log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        debug!(to = %to, subject = %subject, bytes = html.len(), "smtp not configured; email dropped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingMailer, RecordingMailer};

    #[test]
    fn templates_embed_their_payload() {
        let code = Notification::Verification { code: "482913".into() }.render();
        assert!(code.contains("482913"));

        let url = "http://localhost:5173/reset-password/abc123";
        let reset = Notification::PasswordReset { url: url.into() }.render();
        assert!(reset.contains(url));

        let welcome = Notification::Welcome { name: "Ada".into() }.render();
        assert!(welcome.contains("Ada"));
    }

    #[test]
    fn names_are_html_escaped() {
        let html = Notification::Welcome { name: "<script>x</script>".into() }.render();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn dispatch_delivers_through_the_mailer() {
        let (mailer, mut outbox) = RecordingMailer::new();
        dispatch(
            Arc::new(mailer),
            "a@x.com".into(),
            Notification::ResetSuccess,
        )
        .await
        .unwrap();
        let sent = outbox.recv().await.unwrap();
        assert_eq!(sent.to, "a@x.com");
        assert_eq!(sent.subject, "Password reset successful");
    }

    #[tokio::test]
    async fn dispatch_swallows_delivery_errors() {
        let handle = dispatch(
            Arc::new(FailingMailer),
            "a@x.com".into(),
            Notification::Welcome { name: "A".into() },
        );
        assert!(handle.await.is_ok());
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        assert!(LogMailer.send("a@x.com", "s", "<p>b</p>").await.is_ok());
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Captured {
        type Writer = Captured;
        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn log_mailer_keeps_codes_out_of_the_log() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(captured.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let note = Notification::Verification { code: "482913".into() };
        LogMailer
            .send("a@x.com", note.subject(), &note.render())
            .await
            .unwrap();

        let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("smtp not configured"));
        assert!(out.contains("DEBUG"));
        assert!(!out.contains("482913"));
    }
}
