//! Band service
//!
//! Each operation runs in its own transaction: existence checks and writes
//! commit together or not at all. Mutations open theirs with
//! `BEGIN IMMEDIATE`, so the write lock is held before the pre-checks run and
//! concurrent writers queue on the busy timeout. Change events are published
//! after the commit, and a failed publish is only logged.

use artistalbum_common::events::{
    ChangeAction, ChangeEvent, ChangePublisher, PublishError, UPDATES_TOPIC,
};
use artistalbum_common::{time, Error, Result};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::db::{artists, band_artists, bands, ArtistSummary, BandDetails};
use crate::pagination::{Page, PageRequest};

fn band_not_found(id: i64) -> Error {
    Error::NotFound(format!("Band not found: id={}", id))
}

fn artist_not_found(id: i64) -> Error {
    Error::NotFound(format!("Artist not found: id={}", id))
}

fn duplicate_name_message(name: &str) -> String {
    format!("A band named '{}' already exists", name)
}

fn duplicate_name(name: &str) -> Error {
    Error::Conflict(duplicate_name_message(name))
}

/// Band operations over the band and link stores
#[derive(Clone)]
pub struct BandService {
    db: SqlitePool,
    publisher: Arc<dyn ChangePublisher>,
}

impl BandService {
    pub fn new(db: SqlitePool, publisher: Arc<dyn ChangePublisher>) -> Self {
        Self { db, publisher }
    }

    /// Create a band; Conflict if the name is taken (ignoring case)
    pub async fn create(&self, name: &str) -> Result<BandDetails> {
        let mut tx = self.begin_write().await?;

        if bands::exists_by_name(&mut *tx, name).await? {
            return Err(duplicate_name(name));
        }

        // The unique constraint decides when a concurrent create slipped past the check
        let band = bands::insert_band(&mut *tx, name, time::now())
            .await
            .map_err(|e| e.unique_violation_as_conflict(duplicate_name_message(name)))?;

        tx.commit().await?;

        info!(band_id = band.id, name = %band.name, "Band created");
        self.notify(ChangeAction::Created, band.id);

        Ok(BandDetails::new(band, Vec::new()))
    }

    /// Band with its artists resolved
    pub async fn get_by_id(&self, id: i64) -> Result<BandDetails> {
        let mut tx = self.db.begin().await?;

        let details = bands::find_with_artists(&mut *tx, id)
            .await?
            .ok_or_else(|| band_not_found(id))?;

        tx.commit().await?;
        Ok(details)
    }

    /// Every band, sorted by name ascending
    pub async fn list_all(&self) -> Result<Vec<BandDetails>> {
        let mut tx = self.db.begin().await?;
        let all = bands::list_all_with_artists(&mut *tx).await?;
        tx.commit().await?;

        debug!(count = all.len(), "Listed all bands");
        Ok(all)
    }

    /// One page of bands sorted by name in the requested direction
    pub async fn list_paged(&self, request: PageRequest) -> Result<Page<BandDetails>> {
        let mut tx = self.db.begin().await?;

        let total = bands::count(&mut *tx).await?;
        let page_bands =
            bands::list_page(&mut *tx, request.offset(), request.size, request.direction).await?;

        let ids: Vec<i64> = page_bands.iter().map(|b| b.id).collect();
        let mut artists_by_band = band_artists::artists_for_bands(&mut *tx, &ids).await?;

        tx.commit().await?;

        let content = page_bands
            .into_iter()
            .map(|band| {
                let artists = artists_by_band.remove(&band.id).unwrap_or_default();
                BandDetails::new(band, artists)
            })
            .collect();

        Ok(Page::new(content, &request, total))
    }

    /// Rename a band
    ///
    /// Uniqueness is re-checked only when the name changes ignoring case, so
    /// a case-only rename of the same band never conflicts.
    pub async fn update(&self, id: i64, new_name: &str) -> Result<BandDetails> {
        let mut tx = self.begin_write().await?;

        let band = bands::find_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| band_not_found(id))?;

        if bands::name_key(new_name) != bands::name_key(&band.name) {
            if let Some(other) = bands::find_by_name(&mut *tx, new_name).await? {
                if other.id != id {
                    return Err(duplicate_name(new_name));
                }
            }
        }

        let now = time::now();
        bands::update_name(&mut *tx, id, new_name, now)
            .await
            .map_err(|e| e.unique_violation_as_conflict(duplicate_name_message(new_name)))?;

        let artists = band_artists::list_artists_of_band(&mut *tx, id).await?;

        tx.commit().await?;

        info!(band_id = id, old_name = %band.name, new_name = %new_name, "Band updated");
        self.notify(ChangeAction::Updated, id);

        Ok(BandDetails {
            id,
            name: new_name.to_string(),
            created_at: band.created_at,
            updated_at: now,
            artists,
        })
    }

    /// Delete a band and all of its links
    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.begin_write().await?;

        if !bands::exists_by_id(&mut *tx, id).await? {
            return Err(band_not_found(id));
        }

        let links_removed = band_artists::delete_all_for_band(&mut *tx, id).await?;
        bands::delete_by_id(&mut *tx, id).await?;

        tx.commit().await?;

        info!(band_id = id, links_removed, "Band deleted");
        self.notify(ChangeAction::Deleted, id);

        Ok(())
    }

    /// Link an artist to a band
    ///
    /// Returns true if a link was created. An existing link is left alone and
    /// publishes nothing.
    pub async fn link_artist(&self, band_id: i64, artist_id: i64) -> Result<bool> {
        let mut tx = self.begin_write().await?;

        self.ensure_band_and_artist(&mut tx, band_id, artist_id).await?;

        if band_artists::link_exists(&mut *tx, band_id, artist_id).await? {
            debug!(band_id, artist_id, "Artist already linked to band");
            return Ok(false);
        }

        match band_artists::insert_link(&mut *tx, band_id, artist_id).await {
            Ok(()) => {}
            // A concurrent request linked the same pair first
            Err(e) if e.is_unique_violation() => {
                debug!(band_id, artist_id, "Artist linked concurrently");
                return Ok(false);
            }
            Err(e) => return Err(e),
        }

        tx.commit().await?;

        info!(band_id, artist_id, "Artist linked to band");
        self.notify(ChangeAction::Linked, band_id);

        Ok(true)
    }

    /// Remove an artist from a band; a missing link is not an error
    pub async fn unlink_artist(&self, band_id: i64, artist_id: i64) -> Result<()> {
        let mut tx = self.begin_write().await?;

        self.ensure_band_and_artist(&mut tx, band_id, artist_id).await?;

        let removed = band_artists::delete_link(&mut *tx, band_id, artist_id).await?;

        tx.commit().await?;

        info!(band_id, artist_id, removed, "Artist unlinked from band");
        self.notify(ChangeAction::Unlinked, band_id);

        Ok(())
    }

    /// `{id, name}` of every artist linked to the band
    pub async fn list_artists_of_band(&self, band_id: i64) -> Result<Vec<ArtistSummary>> {
        let mut tx = self.db.begin().await?;

        if !bands::exists_by_id(&mut *tx, band_id).await? {
            return Err(band_not_found(band_id));
        }

        let artists = band_artists::list_artists_of_band(&mut *tx, band_id).await?;

        tx.commit().await?;
        Ok(artists)
    }

    /// Write transaction holding the database write lock from the start
    ///
    /// A deferred transaction that reads and then writes fails outright with
    /// SQLITE_BUSY_SNAPSHOT once another connection has committed in between.
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.db.begin_with("BEGIN IMMEDIATE").await?)
    }

    async fn ensure_band_and_artist(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        band_id: i64,
        artist_id: i64,
    ) -> Result<()> {
        if !bands::exists_by_id(&mut **tx, band_id).await? {
            return Err(band_not_found(band_id));
        }
        if !artists::exists_by_id(&mut **tx, artist_id).await? {
            return Err(artist_not_found(artist_id));
        }
        Ok(())
    }

    /// Fire-and-forget publish of a band change
    fn notify(&self, action: ChangeAction, band_id: i64) {
        let event = ChangeEvent::band(action, band_id);

        match self.publisher.publish(UPDATES_TOPIC, &event) {
            Ok(()) => debug!(action = action.as_str(), band_id, "Change event published"),
            Err(PublishError::NoSubscribers(topic)) => {
                debug!(action = action.as_str(), band_id, %topic, "No subscribers for change event")
            }
            Err(e) => warn!(action = action.as_str(), band_id, "Failed to publish change event: {}", e),
        }
    }
}
