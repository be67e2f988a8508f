//! # mindsift-db
//!
//! PostgreSQL storage layer for mindsift.
//!
//! This crate provides:
//! - Connection pool management
//! - Store implementations for notes, ideas, tags, settings, and the
//!   durable job queue
//! - Embedded schema migrations
//! - An in-memory arena implementing the same traits, for tests and
//!   embedded use
//!
//! ## Example
//!
//! ```rust,ignore
//! use mindsift_db::Database;
//! use mindsift_core::{NewNote, NoteOrigin, NoteStore};
//!
//! let db = Database::connect("postgres://localhost/mindsift").await?;
//! db.migrate().await?;
//!
//! let note = db.notes.insert(NewNote {
//!     user_id,
//!     title: None,
//!     content: "Build a subscription tool for freelancers".to_string(),
//!     origin: NoteOrigin::Manual,
//! }).await?;
//! ```

pub mod ideas;
pub mod jobs;
pub mod memory;
pub mod notes;
pub mod pool;
pub mod settings;
pub mod tags;

use std::sync::Arc;

use sqlx::postgres::PgPool;

use mindsift_core::{Error, Result};

// Re-export core types
pub use mindsift_core::*;

// Re-export store implementations
pub use ideas::PgIdeaStore;
pub use jobs::PgJobQueue;
pub use memory::MemoryStore;
pub use notes::PgNoteStore;
pub use pool::{create_pool, PoolConfig};
pub use settings::PgSettingsStore;
pub use tags::PgTagStore;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Aggregate handle over all Postgres-backed stores sharing one pool.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    pub notes: Arc<PgNoteStore>,
    pub ideas: Arc<PgIdeaStore>,
    pub tags: Arc<PgTagStore>,
    pub settings: Arc<PgSettingsStore>,
    pub jobs: Arc<PgJobQueue>,
}

impl Database {
    /// Connect with default pool configuration.
    pub async fn connect(database_url: &str) -> Result<Self> {
        Self::connect_with(database_url, &PoolConfig::default()).await
    }

    /// Connect with explicit pool configuration.
    pub async fn connect_with(database_url: &str, config: &PoolConfig) -> Result<Self> {
        let pool = create_pool(database_url, config).await?;
        Ok(Self::from_pool(pool))
    }

    /// Build the store handles over an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            notes: Arc::new(PgNoteStore::new(pool.clone())),
            ideas: Arc::new(PgIdeaStore::new(pool.clone())),
            tags: Arc::new(PgTagStore::new(pool.clone())),
            settings: Arc::new(PgSettingsStore::new(pool.clone())),
            jobs: Arc::new(PgJobQueue::new(pool.clone())),
            pool,
        }
    }

    /// Run pending schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| Error::Internal(format!("Migration failed: {}", e)))
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
