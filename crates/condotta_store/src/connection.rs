//! Connection establishment and migrations.

use condotta_error::{CondottaResult, StoreError, StoreErrorKind};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Establish a connection to the PostgreSQL database.
///
/// Composes the connection URL from environment variables:
/// - `DATABASE_USER` - PostgreSQL username (required)
/// - `DATABASE_PASSWORD` - PostgreSQL password (required)
/// - `DATABASE_HOST` - Database host (defaults to "localhost")
/// - `DATABASE_PORT` - Database port (defaults to "5432")
/// - `DATABASE_NAME` - Database name (defaults to "condotta")
///
/// Alternatively, a complete `DATABASE_URL` takes precedence.
pub fn establish_connection() -> CondottaResult<PgConnection> {
    let _ = dotenvy::dotenv();

    if let Ok(database_url) = std::env::var("DATABASE_URL") {
        return PgConnection::establish(&database_url)
            .map_err(StoreError::from)
            .map_err(Into::into);
    }

    let user = std::env::var("DATABASE_USER").map_err(|_| {
        StoreError::new(StoreErrorKind::Connection(
            "DATABASE_USER environment variable not set".to_string(),
        ))
    })?;
    let password = std::env::var("DATABASE_PASSWORD").map_err(|_| {
        StoreError::new(StoreErrorKind::Connection(
            "DATABASE_PASSWORD environment variable not set".to_string(),
        ))
    })?;
    let host = std::env::var("DATABASE_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port = std::env::var("DATABASE_PORT").unwrap_or_else(|_| "5432".to_string());
    let name = std::env::var("DATABASE_NAME").unwrap_or_else(|_| "condotta".to_string());

    let database_url = format!("postgres://{user}:{password}@{host}:{port}/{name}");

    PgConnection::establish(&database_url)
        .map_err(StoreError::from)
        .map_err(Into::into)
}

/// Run pending migrations.
pub fn run_migrations(conn: &mut PgConnection) -> CondottaResult<()> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| StoreError::new(StoreErrorKind::Migration(e.to_string())))?;
    if !applied.is_empty() {
        info!(count = applied.len(), "Applied pending migrations");
    }
    Ok(())
}
