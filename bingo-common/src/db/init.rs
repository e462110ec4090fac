//! Database initialization
//!
//! Creates the database on first run, applies the schema idempotently and
//! seeds the admin roster when it is empty.

use crate::roster::DEFAULT_ADMIN_FID;
use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open (creating if needed) the database at `db_path`
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // Readers must not block on a pending submission write
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;
    seed_default_admin(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema
///
/// Pinned to a single connection that never expires: every SQLite memory
/// connection is its own database.
pub async fn connect_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    create_schema(&pool).await?;
    seed_default_admin(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_submissions_table(pool).await?;
    create_admins_table(pool).await?;
    Ok(())
}

async fn create_submissions_table(pool: &SqlitePool) -> Result<()> {
    // UNIQUE(scope, reference) is the linearization point for duplicate proofs
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS submissions (
            guid TEXT PRIMARY KEY,
            scope TEXT NOT NULL,
            reference TEXT NOT NULL,
            symbol TEXT NOT NULL CHECK (symbol IN ('B', 'A', 'S', 'E')),
            identity TEXT NOT NULL,
            sequence_index INTEGER NOT NULL CHECK (sequence_index >= 1),
            created_at TIMESTAMP NOT NULL,
            UNIQUE (scope, reference)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_submissions_scope_created ON submissions (scope, created_at)",
    )
    .execute(pool)
    .await?;

    // One row per position: a stale writer cannot unlock the same symbol twice
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_submissions_scope_position ON submissions (scope, sequence_index)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_admins_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS admins (
            principal TEXT PRIMARY KEY,
            label TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0,
            added_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert the default admin when the roster table is empty
pub async fn seed_default_admin(pool: &SqlitePool) -> Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
        .fetch_one(pool)
        .await?;

    if count == 0 {
        sqlx::query("INSERT INTO admins (principal, label, position) VALUES (?, ?, 0)")
            .bind(format!("fid:{}", DEFAULT_ADMIN_FID))
            .bind(format!("FID: {}", DEFAULT_ADMIN_FID))
            .execute(pool)
            .await?;
        info!("Seeded admin roster with FID {}", DEFAULT_ADMIN_FID);
    }

    Ok(())
}
