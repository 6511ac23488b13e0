//! Local persistence contracts used by the refresh coordinator.

use async_trait::async_trait;

use crate::Error;
use crate::cache::{CountryDb, LAST_REFRESH_KEY};
use crate::country::Country;

/// Local cache of the country list.
#[async_trait]
pub trait CountryStore: Send + Sync {
    /// Load every cached country.
    async fn get_all_countries(&self) -> Result<Vec<Country>, Error>;

    /// Remove every cached country, returning how many were removed.
    async fn delete_all_countries(&self) -> Result<u64, Error>;

    /// Insert `countries` and return the assigned identifiers.
    ///
    /// The result has exactly one id per input record, in input order. The
    /// coordinator assigns ids back to records by position and rejects a
    /// result of the wrong length.
    async fn insert_all(&self, countries: &[Country]) -> Result<Vec<i64>, Error>;

    /// Replace every cached country with `countries`.
    ///
    /// Returns the removed row count and the new ids under the same contract
    /// as `insert_all`. The default deletes and then inserts; stores that can
    /// do both in one transaction override it.
    async fn replace_all(&self, countries: &[Country]) -> Result<(u64, Vec<i64>), Error> {
        let deleted = self.delete_all_countries().await?;
        let ids = self.insert_all(countries).await?;
        Ok((deleted, ids))
    }
}

/// Persistent storage for the last successful network fetch time.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Last refresh timestamp in nanoseconds, if one was ever saved.
    async fn get_time(&self) -> Result<Option<i64>, Error>;

    /// Persist the last refresh timestamp in nanoseconds.
    async fn save_time(&self, nanos: i64) -> Result<(), Error>;
}

#[async_trait]
impl CountryStore for CountryDb {
    async fn get_all_countries(&self) -> Result<Vec<Country>, Error> {
        CountryDb::get_all_countries(self).await
    }

    async fn delete_all_countries(&self) -> Result<u64, Error> {
        CountryDb::delete_all_countries(self).await
    }

    async fn insert_all(&self, countries: &[Country]) -> Result<Vec<i64>, Error> {
        CountryDb::insert_all(self, countries).await
    }

    async fn replace_all(&self, countries: &[Country]) -> Result<(u64, Vec<i64>), Error> {
        CountryDb::replace_all(self, countries).await
    }
}

#[async_trait]
impl PreferenceStore for CountryDb {
    async fn get_time(&self) -> Result<Option<i64>, Error> {
        self.get_preference(LAST_REFRESH_KEY).await
    }

    async fn save_time(&self, nanos: i64) -> Result<(), Error> {
        self.set_preference(LAST_REFRESH_KEY, nanos).await
    }
}
