//! SMTP email delivery.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use bolsa_core::{Error, Result, SmtpConfig};

/// Asynchronous SMTP mailer.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    /// Build a mailer from SMTP settings. STARTTLS on the configured port.
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| Error::Config(format!("invalid SMTP relay {}: {}", config.host, e)))?
            .port(config.port)
            .credentials(creds)
            .build();

        debug!(
            subsystem = "notify",
            component = "smtp",
            host = %config.host,
            port = config.port,
            "SMTP transport configured"
        );

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }

    /// Send a plain-text email. The attachment reference, when present, is
    /// appended to the body as a link rather than uploaded as a MIME part;
    /// résumés live in blob storage and travel by URL.
    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment_url: Option<&str>,
    ) -> Result<()> {
        let full_body = match attachment_url {
            Some(url) => format!("{}\n\nAdjunto: {}", body, url),
            None => body.to_string(),
        };

        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| Error::Notification(format!("invalid from address: {}", e)))?,
            )
            .to(to
                .parse()
                .map_err(|e| Error::Notification(format!("invalid recipient {}: {}", to, e)))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(full_body)
            .map_err(|e| Error::Notification(format!("failed to build message: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| Error::Notification(format!("smtp send to {} failed: {}", to, e)))?;

        info!(
            subsystem = "notify",
            component = "smtp",
            op = "send",
            to = %to,
            subject = %subject,
            "Email sent"
        );
        Ok(())
    }
}
