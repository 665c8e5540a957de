//! Business logic services

pub mod band_service;

pub use band_service::BandService;
