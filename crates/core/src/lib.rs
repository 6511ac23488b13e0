//! Core types and shared functionality for globe.
//!
//! This crate provides:
//! - The country record and the local SQLite store
//! - The refresh coordinator that decides between store and network
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod clock;
pub mod config;
pub mod country;
pub mod error;
pub mod refresh;
pub mod source;
pub mod store;

pub use cache::CountryDb;
pub use clock::{Clock, SystemClock};
pub use config::{AppConfig, ConfigError};
pub use country::Country;
pub use error::Error;
pub use refresh::{Notice, RefreshCoordinator, RefreshObserver, RefreshPath};
pub use source::CountrySource;
pub use store::{CountryStore, PreferenceStore};
