//! Recording mock notifier for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use bolsa_core::{Error, Result};

use crate::Notifier;

/// One recorded email send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment_url: Option<String>,
}

/// One recorded WhatsApp send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentWhatsApp {
    pub phone: String,
    pub message: String,
}

/// Notifier that records every send instead of delivering it. Failure
/// toggles let tests exercise the skip-and-continue paths.
#[derive(Clone, Default)]
pub struct MockNotifier {
    emails: Arc<Mutex<Vec<SentEmail>>>,
    whatsapps: Arc<Mutex<Vec<SentWhatsApp>>>,
    fail_email: Arc<Mutex<bool>>,
    fail_whatsapp: Arc<Mutex<bool>>,
}

impl MockNotifier {
    /// Create a new recording notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent email sends fail.
    pub fn set_fail_email(&self, fail: bool) {
        *self.fail_email.lock().unwrap() = fail;
    }

    /// Make subsequent WhatsApp sends fail.
    pub fn set_fail_whatsapp(&self, fail: bool) {
        *self.fail_whatsapp.lock().unwrap() = fail;
    }

    /// Emails recorded so far.
    pub fn emails(&self) -> Vec<SentEmail> {
        self.emails.lock().unwrap().clone()
    }

    /// WhatsApp messages recorded so far.
    pub fn whatsapps(&self) -> Vec<SentWhatsApp> {
        self.whatsapps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment_url: Option<&str>,
    ) -> Result<()> {
        if *self.fail_email.lock().unwrap() {
            return Err(Error::Notification("mock email failure".to_string()));
        }
        self.emails.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            attachment_url: attachment_url.map(String::from),
        });
        Ok(())
    }

    async fn send_whatsapp(&self, phone: &str, message: &str) -> Result<()> {
        if *self.fail_whatsapp.lock().unwrap() {
            return Err(Error::Notification("mock whatsapp failure".to_string()));
        }
        self.whatsapps.lock().unwrap().push(SentWhatsApp {
            phone: phone.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_sends() {
        let notifier = MockNotifier::new();
        notifier
            .send_email("ana@test.example", "Hola", "cuerpo", Some("https://cv"))
            .await
            .unwrap();
        notifier
            .send_whatsapp("+549261", "mensaje")
            .await
            .unwrap();

        assert_eq!(notifier.emails().len(), 1);
        assert_eq!(notifier.emails()[0].to, "ana@test.example");
        assert_eq!(notifier.whatsapps().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_failure_toggles() {
        let notifier = MockNotifier::new();
        notifier.set_fail_email(true);
        assert!(notifier
            .send_email("a@b.c", "s", "b", None)
            .await
            .is_err());
        assert!(notifier.emails().is_empty());

        notifier.set_fail_email(false);
        assert!(notifier.send_email("a@b.c", "s", "b", None).await.is_ok());
    }
}
