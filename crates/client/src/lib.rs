//! HTTP client for the remote country dataset.
//!
//! This crate provides the network side of the refresh pipeline: a
//! `CountrySource` implementation backed by reqwest and the payload parser.

pub mod fetch;
pub mod payload;

pub use fetch::{ClientConfig, CountryApiClient, UrlError, canonicalize};
pub use payload::parse_countries;
