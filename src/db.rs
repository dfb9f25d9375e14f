//! Schema bootstrap for the SQLite catalog database.

use anyhow::Result;
use sqlx::SqlitePool;

/// Initial schema, embedded so the binary and the tests share one copy.
const INIT_SQL: &str = include_str!("../migrations/0001_init.sql");

/// Apply the embedded schema statement by statement.
pub async fn run_migrations(db: &SqlitePool) -> Result<()> {
    let statements = INIT_SQL
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    tracing::info!("Running {} migration statements...", statements.len());

    for stmt in statements {
        tracing::debug!("Executing migration SQL: {}", stmt);
        sqlx::query(stmt).execute(db).await?;
    }

    Ok(())
}

/// Fresh in-memory database with the schema applied.
///
/// Limited to one connection that never expires: every in-memory connection
/// is a separate database.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    use std::time::Duration;

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory sqlite");
    run_migrations(&pool).await.expect("apply schema");
    pool
}
