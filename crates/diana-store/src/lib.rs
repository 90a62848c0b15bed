//! `PostgreSQL` storage for the Diana Bot engine.

pub mod pg_fragment_repository;
pub mod pg_progression_repository;
pub mod rewards;

use diana_core::error::DomainError;
use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};

/// Schema migrations shipped with the store.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Applies pending schema migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the recorded history does
/// not match the shipped migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

pub(crate) fn storage_error(err: sqlx::Error) -> DomainError {
    DomainError::Storage(err.to_string())
}
