//! bolsa-api: HTTP server wiring for the bolsa recruiting backend.

mod auth;
mod error;
mod handlers;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use bolsa_core::{AppConfig, EmbeddingBackend};
use bolsa_db::Database;
use bolsa_inference::OpenAiBackend;
use bolsa_match::{MatchEngine, MatchEngineConfig, ProposalScheduler};
use bolsa_notify::{GatewayNotifier, Notifier};
use bolsa_tasks::{
    spawn_periodic_purge, DispatchProposalHandler, PurgeExpiredMatchesHandler,
    RegenerateCandidateMatchesHandler, RegenerateJobMatchesHandler, TaskWorker,
};

use crate::handlers::{apply, candidates, jobs, matches, proposals, templates};

/// Shared application state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub engine: Arc<MatchEngine>,
    pub scheduler: Arc<ProposalScheduler>,
    pub embedding: Arc<dyn EmbeddingBackend>,
    pub jwt_secret: String,
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   RUST_LOG    - standard env filter
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bolsa_api=debug,tower_http=debug,bolsa_tasks=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("bolsa-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(non_blocking),
                )
                .init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            registry.with(tracing_subscriber::fmt::layer()).init();
        }
        None
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let _log_guard = init_tracing();

    let config = AppConfig::from_env()?;

    // Connect to database and run pending migrations
    info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database ready");

    // Delivery channels
    let notifier: Arc<dyn Notifier> = Arc::new(GatewayNotifier::new(
        &config.smtp,
        config.whatsapp.as_ref(),
    )?);

    // Embedding backend
    let embedding: Arc<dyn EmbeddingBackend> = Arc::new(OpenAiBackend::new(&config.embedding));
    info!(model = %embedding.model_name(), "Embedding backend initialized");

    // Pipeline components
    let engine = Arc::new(MatchEngine::new(
        db.clone(),
        notifier.clone(),
        MatchEngineConfig {
            frontend_base_url: config.frontend_base_url.clone(),
            ..MatchEngineConfig::default()
        },
    ));
    let scheduler = Arc::new(ProposalScheduler::new(
        db.clone(),
        notifier.clone(),
        config.proposal_send_delay,
    ));

    // Background worker
    let _worker_handle = if config.worker.enabled {
        info!("Starting task worker...");
        let worker = TaskWorker::new(db.clone(), config.worker.clone());

        worker
            .register_handler(RegenerateJobMatchesHandler::new(engine.clone()))
            .await;
        worker
            .register_handler(RegenerateCandidateMatchesHandler::new(engine.clone()))
            .await;
        worker
            .register_handler(DispatchProposalHandler::new(scheduler.clone()))
            .await;
        worker
            .register_handler(PurgeExpiredMatchesHandler::new(db.clone()))
            .await;

        let handle = worker.start();
        info!("Task worker started");

        spawn_periodic_purge(
            db.clone(),
            std::time::Duration::from_secs(bolsa_core::defaults::PURGE_INTERVAL_SECS),
        );

        Some(handle)
    } else {
        info!("Task worker disabled");
        None
    };

    let state = AppState {
        db,
        engine,
        scheduler,
        embedding,
        jwt_secret: config.jwt_secret.clone(),
    };

    // Build router
    let app = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Public pipeline endpoints
        .route("/api/job/apply/:token", get(apply::apply_with_token))
        .route("/api/proposals", post(proposals::create_proposal))
        .route("/api/proposals/cancel", post(proposals::cancel_proposal))
        // Admin: matchings panel
        .route("/api/admin/matches", get(matches::list_matches))
        .route("/api/admin/matches/:id/resend", post(matches::resend_match))
        .route(
            "/api/admin/matches/preview/job/:id",
            get(matches::preview_job_matches),
        )
        .route(
            "/api/admin/matches/preview/candidate/:id",
            get(matches::preview_candidate_matches),
        )
        // Admin: proposals
        .route("/api/admin/proposals", get(proposals::list_proposals))
        .route("/api/admin/proposals/:id/send", post(proposals::send_proposal))
        // Admin: proposal templates
        .route(
            "/api/admin/templates",
            get(templates::list_templates).post(templates::create_template),
        )
        .route(
            "/api/admin/templates/:id",
            put(templates::update_template).delete(templates::delete_template),
        )
        .route(
            "/api/admin/templates/:id/set-default",
            post(templates::set_default_template),
        )
        // Admin: job postings
        .route(
            "/api/admin/jobs",
            get(jobs::list_jobs).post(jobs::create_job),
        )
        .route(
            "/api/admin/jobs/:id",
            put(jobs::update_job).delete(jobs::delete_job),
        )
        // Admin: candidates
        .route(
            "/api/admin/candidates/:id/resume",
            post(candidates::update_resume),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!(%addr, "bolsa-api listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
