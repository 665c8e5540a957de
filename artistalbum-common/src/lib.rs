//! # Artist/Album Common Library
//!
//! Shared code for the artist/album backend services:
//! - Error taxonomy
//! - Configuration loading
//! - Database initialization and schema
//! - Change events and the EventBus
//! - Timestamp helper

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
