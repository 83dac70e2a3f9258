//! # bolsa-notify
//!
//! Notification gateway for the bolsa recruiting backend.
//!
//! This crate provides:
//! - The [`Notifier`] trait the pipeline sends through
//! - SMTP email delivery (lettre)
//! - WhatsApp delivery over an HTTP gateway (reqwest)
//! - A recording mock for tests

pub mod email;
pub mod mock;
pub mod whatsapp;

use async_trait::async_trait;
use tracing::debug;

use bolsa_core::{Error, Result, SmtpConfig, WhatsAppConfig};

pub use email::SmtpMailer;
pub use mock::{MockNotifier, SentEmail, SentWhatsApp};
pub use whatsapp::WhatsAppClient;

/// Synchronous send of an email or a phone message. Implementations either
/// deliver or return an error; the pipeline decides what a failure means
/// (skip the match, leave the proposal waiting).
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send an email, optionally carrying one attachment reference.
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment_url: Option<&str>,
    ) -> Result<()>;

    /// Send a message to a phone number.
    async fn send_whatsapp(&self, phone: &str, message: &str) -> Result<()>;
}

/// Production notifier: SMTP for email, optional WhatsApp gateway for
/// phone messages.
pub struct GatewayNotifier {
    mailer: SmtpMailer,
    whatsapp: Option<WhatsAppClient>,
}

impl GatewayNotifier {
    /// Build the notifier from channel settings.
    pub fn new(smtp: &SmtpConfig, whatsapp: Option<&WhatsAppConfig>) -> Result<Self> {
        if whatsapp.is_none() {
            debug!(
                subsystem = "notify",
                "WhatsApp gateway not configured; phone notifications disabled"
            );
        }
        Ok(Self {
            mailer: SmtpMailer::new(smtp)?,
            whatsapp: whatsapp.map(WhatsAppClient::new),
        })
    }
}

#[async_trait]
impl Notifier for GatewayNotifier {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment_url: Option<&str>,
    ) -> Result<()> {
        self.mailer.send(to, subject, body, attachment_url).await
    }

    async fn send_whatsapp(&self, phone: &str, message: &str) -> Result<()> {
        match &self.whatsapp {
            Some(client) => client.send(phone, message).await,
            None => Err(Error::Notification(
                "whatsapp channel not configured".to_string(),
            )),
        }
    }
}
