//! SQLite-backed local store for the country list and refresh preferences.
//!
//! Access goes through tokio-rusqlite, which runs every statement on a
//! dedicated background thread. The store provides:
//!
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Wholesale replacement of the country table with order-preserving ids
//! - A small key/value table for the last-refresh timestamp

pub mod connection;
pub mod countries;
pub mod migrations;
pub mod preferences;

pub use crate::Error;

pub use connection::CountryDb;
pub use preferences::LAST_REFRESH_KEY;
