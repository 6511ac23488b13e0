//! Country record shared by the network source, the store and observers.

use serde::{Deserialize, Serialize};

/// A country as delivered by the remote dataset.
///
/// `uuid` is assigned by the local store on insert. It is `None` for records
/// that have never been persisted and is never part of the JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub population: Option<i64>,
    #[serde(default, rename = "flag")]
    pub flag_url: Option<String>,
    #[serde(skip)]
    pub uuid: Option<i64>,
}

impl Country {
    /// Create an unpersisted country with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: None,
            capital: None,
            region: None,
            currency: None,
            language: None,
            population: None,
            flag_url: None,
            uuid: None,
        }
    }
}
