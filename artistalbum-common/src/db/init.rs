//! Database initialization
//!
//! Opens (creating if needed) the SQLite database and creates the bands
//! schema. Table creation is idempotent, so it runs on every startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Pool and connection tuning
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseOptions {
    /// SQLite busy timeout; the only timeout applied to store access
    pub busy_timeout_ms: u64,
    pub max_connections: u32,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5000,
            max_connections: 10,
        }
    }
}

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path, options: &DatabaseOptions) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Pragmas go on the connect options so every pooled connection gets them,
    // foreign_keys in particular is per-connection in SQLite
    let connect_options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(options.busy_timeout_ms));

    let pool = SqlitePoolOptions::new()
        .max_connections(options.max_connections)
        .connect_with(connect_options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    info!(
        "Database ready (busy timeout {} ms, max {} connections)",
        options.busy_timeout_ms, options.max_connections
    );

    Ok(pool)
}

/// In-memory database with the full schema
///
/// Limited to a single connection: each SQLite in-memory connection is its
/// own database.
pub async fn init_in_memory() -> Result<SqlitePool> {
    let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create every table and index (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_artists_table(pool).await?;
    create_bands_table(pool).await?;

    // Linking tables
    create_band_artists_table(pool).await?;

    Ok(())
}

/// Artists are owned by another part of the system; only id and name are read here
pub async fn create_artists_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artists (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// `name_key` holds the lowercased name; its unique constraint is what
/// finally decides case-insensitive name conflicts
pub async fn create_bands_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bands (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            name_key TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL,
            CONSTRAINT uk_bands_name_key UNIQUE (name_key),
            CHECK (length(name) BETWEEN 1 AND 255)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_bands_name ON bands(name COLLATE NOCASE)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_band_artists_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS band_artists (
            band_id INTEGER NOT NULL REFERENCES bands(id) ON DELETE CASCADE,
            artist_id INTEGER NOT NULL REFERENCES artists(id) ON DELETE CASCADE,
            PRIMARY KEY (band_id, artist_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_band_artists_artist ON band_artists(artist_id)")
        .execute(pool)
        .await?;

    Ok(())
}
