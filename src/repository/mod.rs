//! Repository layer for catalog storage.
//!
//! Each entity group has its own trait; `PgRepository` implements them over
//! PostgreSQL and `MemoryRepository` keeps everything in process.

pub mod authors;
pub mod books;
pub mod instances;
pub mod memory;
pub mod taxonomy;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::error::{AppError, AppResult};

pub use authors::AuthorsRepository;
pub use books::BooksRepository;
pub use instances::InstancesRepository;
pub use memory::MemoryRepository;
pub use taxonomy::TaxonomyRepository;

/// Everything the services need from storage
#[async_trait]
pub trait Repository:
    AuthorsRepository + BooksRepository + InstancesRepository + TaxonomyRepository + Send + Sync
{
    /// Check that storage is reachable
    async fn ping(&self) -> AppResult<()>;
}

/// PostgreSQL-backed repository holding the connection pool
#[derive(Clone)]
pub struct PgRepository {
    pub pool: Pool<Postgres>,
}

impl PgRepository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Map a unique-constraint violation to a conflict, pass anything else through
pub(crate) fn unique_violation(e: sqlx::Error, message: &str) -> AppError {
    constraint_violation(e, "23505", message)
}

/// Map a foreign-key violation to a conflict, pass anything else through
pub(crate) fn foreign_key_violation(e: sqlx::Error, message: &str) -> AppError {
    constraint_violation(e, "23503", message)
}

fn constraint_violation(e: sqlx::Error, sqlstate: &str, message: &str) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some(sqlstate) {
            return AppError::Conflict(message.to_string());
        }
    }
    AppError::Database(e)
}
