//! Postgres implementations of the persistence ports.
//!
//! Course, lesson, and enrollment documents live in JSONB columns with
//! the ordering fields (`last_edited_on`, `updated_at`) mirrored into
//! indexed columns. Authoring sessions run SERIALIZABLE so concurrent
//! edits to the same pair lose with a serialization failure the
//! coordinator maps to `Conflict`.

mod authoring;
mod courses;
mod enrollments;

pub use authoring::PostgresAuthoringStore;
pub use courses::PostgresCourseRepository;
pub use enrollments::PostgresEnrollmentRepository;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::{AuthoringError, Result};

/// Connects a pool against `database_url`.
pub async fn connect(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|e| AuthoringError::from_sqlx(e, "connect to document store"))
}

/// Applies the embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| {
            AuthoringError::Internal(format!("failed to run migrations: {e}"))
        })
}
