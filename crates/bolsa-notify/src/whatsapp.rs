//! WhatsApp delivery over an HTTP gateway.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::info;

use bolsa_core::{Error, Result, WhatsAppConfig};

/// Request timeout for gateway calls.
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Client for a WhatsApp HTTP gateway.
pub struct WhatsAppClient {
    client: Client,
    api_url: String,
    token: String,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    phone: &'a str,
    message: &'a str,
}

impl WhatsAppClient {
    /// Create a client from gateway settings.
    pub fn new(config: &WhatsAppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_url: config.api_url.clone(),
            token: config.token.clone(),
        }
    }

    /// Send a message to a phone number.
    pub async fn send(&self, phone: &str, message: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&SendMessageRequest { phone, message })
            .send()
            .await
            .map_err(|e| Error::Notification(format!("whatsapp request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Notification(format!(
                "whatsapp gateway returned {}",
                status
            )));
        }

        info!(
            subsystem = "notify",
            component = "whatsapp",
            op = "send",
            phone = %phone,
            "WhatsApp message sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_fields() {
        let req = SendMessageRequest {
            phone: "+5492610000000",
            message: "Tienes nueva propuesta",
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["phone"], "+5492610000000");
        assert_eq!(json["message"], "Tienes nueva propuesta");
    }
}
