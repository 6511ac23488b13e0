//! Remote country data source contract.

use async_trait::async_trait;

use crate::Error;
use crate::country::Country;

/// Fetches the full country list from a remote source.
///
/// One call is one request: no pagination, no parameters, no retries.
#[async_trait]
pub trait CountrySource: Send + Sync {
    async fn fetch_countries(&self) -> Result<Vec<Country>, Error>;
}
