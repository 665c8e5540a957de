//! Artist lookups
//!
//! Artists are managed elsewhere; bands only need to know that an artist
//! exists. `insert_artist` seeds rows for fixtures and tests.

use artistalbum_common::Result;
use sqlx::SqliteConnection;

pub async fn exists_by_id(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM artists WHERE id = ?)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(exists)
}

/// Insert an artist and return its generated id
pub async fn insert_artist(conn: &mut SqliteConnection, name: &str) -> Result<i64> {
    let id: i64 = sqlx::query_scalar("INSERT INTO artists (name) VALUES (?) RETURNING id")
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;
    Ok(id)
}
