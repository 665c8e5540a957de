//! Database access layer for the bands service
//!
//! Store functions take a `&mut SqliteConnection` so the service can run
//! several of them inside one transaction.

pub mod artists;
pub mod band_artists;
pub mod bands;
pub mod models;

pub use models::{ArtistSummary, Band, BandDetails};
