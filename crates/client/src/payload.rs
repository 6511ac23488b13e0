//! Country list payload parsing.

use globe_core::{Country, Error};

/// Parse the dataset body: a JSON array of country objects.
///
/// Fields other than `name` may be missing or null. Any `uuid` in the payload
/// is ignored; identifiers are assigned by the local store.
pub fn parse_countries(body: &[u8]) -> Result<Vec<Country>, Error> {
    let countries: Vec<Country> = serde_json::from_slice(body)?;
    Ok(countries)
}
