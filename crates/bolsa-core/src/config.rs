//! Application configuration.
//!
//! Configuration is read from the environment exactly once at process
//! start, assembled into an [`AppConfig`], and injected into component
//! constructors. No component reads environment variables after startup.

use std::time::Duration;

use crate::defaults;
use crate::error::{Error, Result};

/// SMTP delivery settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// From address; defaults to the SMTP username.
    pub from: String,
}

/// WhatsApp HTTP gateway settings. Absent when the channel is not
/// configured; phone notifications are then skipped.
#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub api_url: String,
    pub token: String,
}

/// Embedding backend settings.
#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

/// Background worker settings.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub enabled: bool,
    pub poll_interval_ms: u64,
    pub max_concurrent: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: defaults::TASK_POLL_INTERVAL_MS,
            max_concurrent: defaults::TASK_MAX_CONCURRENT,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Base URL for apply links embedded in invitation emails.
    pub frontend_base_url: String,
    /// Delay before an automatic proposal is dispatched.
    pub proposal_send_delay: Duration,
    /// HS256 secret for admin bearer tokens.
    pub jwt_secret: String,
    pub smtp: SmtpConfig,
    pub whatsapp: Option<WhatsAppConfig>,
    pub embedding: EmbeddingSettings,
    pub worker: WorkerSettings,
}

fn required(var: &str) -> Result<String> {
    std::env::var(var).map_err(|_| Error::Config(format!("{} is not set", var)))
}

fn optional(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

fn parsed_or<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Assemble configuration from the environment.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `DATABASE_URL` | `postgres://localhost/bolsa` | PostgreSQL connection string |
    /// | `HOST` / `PORT` | `0.0.0.0` / `3000` | HTTP bind address |
    /// | `FRONTEND_BASE_URL` | see `defaults` | base for apply links |
    /// | `PROPOSAL_SEND_DELAY_SECS` | `300` | automatic-proposal delay |
    /// | `JWT_SECRET` | required | admin auth secret |
    /// | `SMTP_HOST`/`SMTP_PORT` | `smtp.gmail.com` / `587` | SMTP relay |
    /// | `SMTP_USER`/`SMTP_PASS` | required | SMTP credentials |
    /// | `SMTP_FROM` | `SMTP_USER` | From address |
    /// | `WHATSAPP_API_URL`/`WHATSAPP_TOKEN` | unset | phone channel, optional |
    /// | `EMBEDDING_API_URL` | OpenAI embeddings endpoint | |
    /// | `OPENAI_API_KEY` | required | embedding backend key |
    /// | `EMBEDDING_MODEL` | `text-embedding-ada-002` | |
    /// | `WORKER_ENABLED` | `true` | enable the task worker |
    /// | `TASK_POLL_INTERVAL_MS` | `500` | worker poll interval |
    /// | `TASK_MAX_CONCURRENT` | `4` | worker concurrency |
    pub fn from_env() -> Result<Self> {
        let smtp_user = required("SMTP_USER")?;
        let smtp = SmtpConfig {
            host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            port: parsed_or("SMTP_PORT", 587),
            from: optional("SMTP_FROM").unwrap_or_else(|| smtp_user.clone()),
            username: smtp_user,
            password: required("SMTP_PASS")?,
        };

        let whatsapp = match (optional("WHATSAPP_API_URL"), optional("WHATSAPP_TOKEN")) {
            (Some(api_url), Some(token)) => Some(WhatsAppConfig { api_url, token }),
            _ => None,
        };

        let embedding = EmbeddingSettings {
            api_url: std::env::var("EMBEDDING_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/embeddings".to_string()),
            api_key: required("OPENAI_API_KEY")?,
            model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| defaults::EMBEDDING_MODEL.to_string()),
        };

        let worker = WorkerSettings {
            enabled: std::env::var("WORKER_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            poll_interval_ms: parsed_or("TASK_POLL_INTERVAL_MS", defaults::TASK_POLL_INTERVAL_MS),
            max_concurrent: parsed_or("TASK_MAX_CONCURRENT", defaults::TASK_MAX_CONCURRENT).max(1),
        };

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/bolsa".to_string()),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parsed_or("PORT", 3000),
            frontend_base_url: std::env::var("FRONTEND_BASE_URL")
                .unwrap_or_else(|_| defaults::FRONTEND_BASE_URL.to_string()),
            proposal_send_delay: Duration::from_secs(parsed_or(
                "PROPOSAL_SEND_DELAY_SECS",
                defaults::PROPOSAL_SEND_DELAY_SECS,
            )),
            jwt_secret: required("JWT_SECRET")?,
            smtp,
            whatsapp,
            embedding,
            worker,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_settings_default() {
        let settings = WorkerSettings::default();
        assert!(settings.enabled);
        assert_eq!(settings.poll_interval_ms, defaults::TASK_POLL_INTERVAL_MS);
        assert_eq!(settings.max_concurrent, defaults::TASK_MAX_CONCURRENT);
    }

    #[test]
    fn test_required_reports_variable_name() {
        let err = required("BOLSA_TEST_UNSET_VARIABLE").unwrap_err();
        assert!(err.to_string().contains("BOLSA_TEST_UNSET_VARIABLE"));
    }

    #[test]
    fn test_parsed_or_falls_back_on_garbage() {
        // Variable not set at all
        assert_eq!(parsed_or::<u16>("BOLSA_TEST_UNSET_PORT", 42), 42);
    }
}
