//! # bolsa-db
//!
//! PostgreSQL database layer for the bolsa recruiting backend.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for all core entities
//! - Vector similarity scoring with pgvector
//! - The delayed task queue backing the background worker
//!
//! ## Example
//!
//! ```rust,ignore
//! use bolsa_db::Database;
//! use bolsa_core::MatchRepository;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/bolsa").await?;
//!     let inserted = db.matches.regenerate_for_job(job_id).await?;
//!     println!("Inserted {} matches", inserted);
//!     Ok(())
//! }
//! ```

pub mod candidates;
pub mod jobs;
pub mod matches;
pub mod pool;
pub mod proposals;
pub mod tasks;
pub mod templates;

// Test fixtures for integration tests
// Note: always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use bolsa_core::*;

// Re-export repository implementations
pub use candidates::PgCandidateRepository;
pub use jobs::PgJobRepository;
pub use matches::PgMatchRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use proposals::PgProposalRepository;
pub use tasks::PgTaskRepository;
pub use templates::PgTemplateRepository;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Job posting repository.
    pub jobs: PgJobRepository,
    /// Candidate repository.
    pub candidates: PgCandidateRepository,
    /// Match repository (regeneration, invitations, apply tokens).
    pub matches: PgMatchRepository,
    /// Proposal repository.
    pub proposals: PgProposalRepository,
    /// Proposal template repository.
    pub templates: PgTemplateRepository,
    /// Delayed task queue repository.
    pub tasks: PgTaskRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            jobs: PgJobRepository::new(pool.clone()),
            candidates: PgCandidateRepository::new(pool.clone()),
            matches: PgMatchRepository::new(pool.clone()),
            proposals: PgProposalRepository::new(pool.clone()),
            templates: PgTemplateRepository::new(pool.clone()),
            tasks: PgTaskRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            jobs: PgJobRepository::new(self.pool.clone()),
            candidates: PgCandidateRepository::new(self.pool.clone()),
            matches: PgMatchRepository::new(self.pool.clone()),
            proposals: PgProposalRepository::new(self.pool.clone()),
            templates: PgTemplateRepository::new(self.pool.clone()),
            // Clones share the notify handle so an enqueue through any clone
            // wakes the worker.
            tasks: PgTaskRepository::with_notify(self.pool.clone(), self.tasks.task_notify()),
        }
    }
}
