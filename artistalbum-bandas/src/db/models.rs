//! Database models

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Band row
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `{id, name}` view of an artist linked to a band
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistSummary {
    pub id: i64,
    pub name: String,
}

/// Band with its linked artists resolved, as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandDetails {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub artists: Vec<ArtistSummary>,
}

impl BandDetails {
    pub fn new(band: Band, artists: Vec<ArtistSummary>) -> Self {
        Self {
            id: band.id,
            name: band.name,
            created_at: band.created_at,
            updated_at: band.updated_at,
            artists,
        }
    }
}
