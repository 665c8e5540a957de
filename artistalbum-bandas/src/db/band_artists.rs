//! Band-artist link persistence
//!
//! A link is identified by the `(band_id, artist_id)` pair alone, so every
//! write here is a single targeted statement on that key.

use artistalbum_common::Result;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use std::collections::HashMap;

use super::models::ArtistSummary;

pub async fn link_exists(
    conn: &mut SqliteConnection,
    band_id: i64,
    artist_id: i64,
) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM band_artists WHERE band_id = ? AND artist_id = ?)",
    )
    .bind(band_id)
    .bind(artist_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(exists)
}

/// Insert a link; a duplicate pair fails with a primary-key violation
pub async fn insert_link(conn: &mut SqliteConnection, band_id: i64, artist_id: i64) -> Result<()> {
    sqlx::query("INSERT INTO band_artists (band_id, artist_id) VALUES (?, ?)")
        .bind(band_id)
        .bind(artist_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Delete one link by its key. Deleting a missing link is not an error.
pub async fn delete_link(
    conn: &mut SqliteConnection,
    band_id: i64,
    artist_id: i64,
) -> Result<u64> {
    let result = sqlx::query("DELETE FROM band_artists WHERE band_id = ? AND artist_id = ?")
        .bind(band_id)
        .bind(artist_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Remove every link of a band (cascade step of band deletion)
pub async fn delete_all_for_band(conn: &mut SqliteConnection, band_id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM band_artists WHERE band_id = ?")
        .bind(band_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Artists linked to a band, ordered by name
///
/// The inner join drops any link whose artist row is absent.
pub async fn list_artists_of_band(
    conn: &mut SqliteConnection,
    band_id: i64,
) -> Result<Vec<ArtistSummary>> {
    let rows = sqlx::query(
        r#"
        SELECT a.id, a.name
        FROM band_artists ba
        JOIN artists a ON a.id = ba.artist_id
        WHERE ba.band_id = ?
        ORDER BY a.name COLLATE NOCASE, a.id
        "#,
    )
    .bind(band_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(ArtistSummary {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
            })
        })
        .collect()
}

/// Artists of several bands at once, keyed by band id
///
/// One query for the whole set; bands without links are absent from the map.
pub async fn artists_for_bands(
    conn: &mut SqliteConnection,
    band_ids: &[i64],
) -> Result<HashMap<i64, Vec<ArtistSummary>>> {
    let mut by_band: HashMap<i64, Vec<ArtistSummary>> = HashMap::new();
    if band_ids.is_empty() {
        return Ok(by_band);
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT ba.band_id, a.id, a.name \
         FROM band_artists ba \
         JOIN artists a ON a.id = ba.artist_id \
         WHERE ba.band_id IN (",
    );
    let mut separated = builder.separated(", ");
    for id in band_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY a.name COLLATE NOCASE, a.id");

    let rows = builder.build().fetch_all(&mut *conn).await?;

    for row in rows {
        let band_id: i64 = row.try_get("band_id")?;
        by_band.entry(band_id).or_default().push(ArtistSummary {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
        });
    }

    Ok(by_band)
}
