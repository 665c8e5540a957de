//! HTTP API handlers for the bands service

pub mod bandas;
pub mod health;
pub mod sse;

pub use bandas::band_routes;
pub use health::health_routes;
pub use sse::event_stream;
