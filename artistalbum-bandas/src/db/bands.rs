//! Band persistence
//!
//! Name uniqueness is case-insensitive: every row stores `name_key`, the
//! lowercased name, under a unique constraint. Reads that expose artists
//! resolve links and artist names in the same query.

use artistalbum_common::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use super::models::{ArtistSummary, Band, BandDetails};
use crate::pagination::SortDirection;

const BAND_COLUMNS: &str = "id, name, created_at, updated_at";

/// Joined read: one row per (band, linked artist), or one row with NULL
/// artist columns for a band without links
const BAND_WITH_ARTISTS_SELECT: &str = r#"
    SELECT b.id, b.name, b.created_at, b.updated_at,
           a.id AS artist_id, a.name AS artist_name
    FROM bands b
    LEFT JOIN band_artists ba ON ba.band_id = b.id
    LEFT JOIN artists a ON a.id = ba.artist_id
"#;

/// Case-folded form used for uniqueness
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}

fn band_from_row(row: &SqliteRow) -> Result<Band> {
    Ok(Band {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Fold joined rows into bands, keeping row order
///
/// Rows must be ordered so that all rows of one band are adjacent. A link
/// whose artist row is missing shows up with NULL artist columns and is
/// skipped.
fn collect_band_details(rows: &[SqliteRow]) -> Result<Vec<BandDetails>> {
    let mut result: Vec<BandDetails> = Vec::new();

    for row in rows {
        let id: i64 = row.try_get("id")?;

        let is_new_band = result.last().map_or(true, |last| last.id != id);
        if is_new_band {
            result.push(BandDetails::new(band_from_row(row)?, Vec::new()));
        }

        let artist_id: Option<i64> = row.try_get("artist_id")?;
        let artist_name: Option<String> = row.try_get("artist_name")?;
        if let (Some(artist_id), Some(artist_name), Some(current)) =
            (artist_id, artist_name, result.last_mut())
        {
            current.artists.push(ArtistSummary {
                id: artist_id,
                name: artist_name,
            });
        }
    }

    Ok(result)
}

/// Insert a new band with both timestamps set to `now`
pub async fn insert_band(
    conn: &mut SqliteConnection,
    name: &str,
    now: DateTime<Utc>,
) -> Result<Band> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO bands (name, name_key, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(name_key(name))
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Band {
        id,
        name: name.to_string(),
        created_at: now,
        updated_at: now,
    })
}

/// Load band by id (links not resolved)
pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<Band>> {
    let row = sqlx::query(&format!("SELECT {} FROM bands WHERE id = ?", BAND_COLUMNS))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(band_from_row).transpose()
}

/// Load band by id with every linked artist, in one query
pub async fn find_with_artists(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<BandDetails>> {
    let rows = sqlx::query(&format!(
        "{} WHERE b.id = ? ORDER BY a.name COLLATE NOCASE, a.id",
        BAND_WITH_ARTISTS_SELECT
    ))
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(collect_band_details(&rows)?.into_iter().next())
}

/// All bands sorted by name ascending, each with its artists, in one query
pub async fn list_all_with_artists(conn: &mut SqliteConnection) -> Result<Vec<BandDetails>> {
    let rows = sqlx::query(&format!(
        "{} ORDER BY b.name COLLATE NOCASE ASC, b.id ASC, a.name COLLATE NOCASE, a.id",
        BAND_WITH_ARTISTS_SELECT
    ))
    .fetch_all(&mut *conn)
    .await?;

    collect_band_details(&rows)
}

/// One page of bands sorted by name (ties broken by id in the same direction)
pub async fn list_page(
    conn: &mut SqliteConnection,
    offset: i64,
    limit: i64,
    direction: SortDirection,
) -> Result<Vec<Band>> {
    let order = direction.as_sql();
    let rows = sqlx::query(&format!(
        "SELECT {} FROM bands ORDER BY name COLLATE NOCASE {}, id {} LIMIT ? OFFSET ?",
        BAND_COLUMNS, order, order
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(band_from_row).collect()
}

pub async fn count(conn: &mut SqliteConnection) -> Result<i64> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bands")
        .fetch_one(&mut *conn)
        .await?;
    Ok(total)
}

/// Rename a band and refresh `updated_at`; `created_at` is never written here
///
/// Returns false if no band has that id.
pub async fn update_name(
    conn: &mut SqliteConnection,
    id: i64,
    name: &str,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE bands
        SET name = ?, name_key = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(name_key(name))
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete the band row. Links must already be gone (see `band_artists::delete_all_for_band`).
pub async fn delete_by_id(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM bands WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn exists_by_id(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bands WHERE id = ?)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(exists)
}

/// Case-insensitive name check
pub async fn exists_by_name(conn: &mut SqliteConnection, name: &str) -> Result<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bands WHERE name_key = ?)")
            .bind(name_key(name))
            .fetch_one(&mut *conn)
            .await?;
    Ok(exists)
}

/// Case-insensitive lookup
pub async fn find_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<Band>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM bands WHERE name_key = ?",
        BAND_COLUMNS
    ))
    .bind(name_key(name))
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(band_from_row).transpose()
}
