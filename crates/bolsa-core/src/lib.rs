//! # bolsa-core
//!
//! Core types, traits, and abstractions for the bolsa recruiting backend.
//!
//! This crate provides the foundational data structures and trait
//! definitions that other bolsa crates depend on: the domain models
//! (jobs, candidates, matches, proposals, templates, tasks), the error
//! taxonomy, the repository traits, the template renderer, apply-token
//! generation, and the application configuration.

pub mod config;
pub mod defaults;
pub mod error;
pub mod ids;
pub mod models;
pub mod template;
pub mod token;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::{AppConfig, EmbeddingSettings, SmtpConfig, WhatsAppConfig, WorkerSettings};
pub use error::{Error, Result};
pub use ids::new_v7;
pub use models::*;
pub use template::{
    render, render_str, score_percent, RenderedMessage, TemplateContext, FALLBACK_SUBJECT,
};
pub use token::{apply_link, generate_apply_token, APPLY_TOKEN_BYTES};
pub use traits::*;
