//! Outbound mail.
//!
//! [`SmtpMailer`] relays through an SMTP server with lettre. Without an
//! `SMTP_HOST` the [`LogMailer`] writes messages to the log instead.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

use crate::config::{SmtpSettings, MAIL_SENDER_NAME};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Implicit TLS submission port
const SMTPS_PORT: u16 = 465;

/// A plain text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingMail {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Mail transport trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver one message; failures surface as `Delivery`
    async fn send_mail(&self, mail: OutgoingMail) -> AppResult<()>;

    /// Verify the transport can reach its relay
    async fn health_check(&self) -> AppResult<()>;

    /// Release transport resources before exit
    async fn shutdown(&self);
}

/// Select the transport from settings.
pub fn build_mailer(settings: &SmtpSettings) -> AppResult<Arc<dyn MailTransport>> {
    if settings.is_configured() {
        Ok(Arc::new(SmtpMailer::new(settings)?))
    } else {
        tracing::warn!("SMTP not configured - mail will be logged instead of sent");
        Ok(Arc::new(LogMailer))
    }
}

/// SMTP relay transport
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> AppResult<Self> {
        let host = settings
            .host
            .as_deref()
            .ok_or_else(|| AppError::internal("SMTP host is not configured"))?;

        let builder = if settings.port == SMTPS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        }
        .map_err(|e| AppError::internal(format!("Invalid SMTP relay: {}", e)))?
        .port(settings.port);

        let builder = match (&settings.user, settings.password()) {
            (Some(user), Some(pass)) => {
                builder.credentials(Credentials::new(user.clone(), pass.to_string()))
            }
            _ => builder,
        };

        let address = settings
            .from
            .parse()
            .map_err(|e| AppError::internal(format!("Invalid SMTP_FROM address: {}", e)))?;

        Ok(Self {
            transport: builder.build(),
            from: Mailbox::new(Some(MAIL_SENDER_NAME.to_string()), address),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send_mail(&self, mail: OutgoingMail) -> AppResult<()> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| AppError::delivery(format!("Invalid recipient {}: {}", mail.to, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)
            .map_err(|e| AppError::delivery(format!("Message build failed: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::delivery(format!("SMTP send to {} failed: {}", mail.to, e)))?;

        tracing::info!(to = %mail.to, "Mail sent");
        Ok(())
    }

    async fn health_check(&self) -> AppResult<()> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::delivery("SMTP relay refused the connection")),
            Err(e) => Err(AppError::delivery(format!("SMTP relay unreachable: {}", e))),
        }
    }

    async fn shutdown(&self) {
        tracing::info!("Closing SMTP transport");
    }
}

/// Development transport that only logs
pub struct LogMailer;

#[async_trait]
impl MailTransport for LogMailer {
    async fn send_mail(&self, mail: OutgoingMail) -> AppResult<()> {
        tracing::info!(
            "=== EMAIL (not sent) ===\n\
             To: {}\n\
             Subject: {}\n\
             Body:\n{}\n\
             ========================",
            mail.to,
            mail.subject,
            mail.body
        );
        Ok(())
    }

    async fn health_check(&self) -> AppResult<()> {
        Ok(())
    }

    async fn shutdown(&self) {}
}
