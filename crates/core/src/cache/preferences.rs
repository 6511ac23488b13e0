//! Key/value preferences stored next to the country table.

use super::connection::CountryDb;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Preference key holding the nanosecond timestamp of the last network fetch.
pub const LAST_REFRESH_KEY: &str = "last_refresh_nanos";

impl CountryDb {
    /// Read an integer preference.
    ///
    /// Returns None if the key has never been written.
    pub async fn get_preference(&self, key: &str) -> Result<Option<i64>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<i64>, Error> {
                let result = conn.query_row("SELECT value FROM preferences WHERE key = ?1", params![key], |row| {
                    row.get(0)
                });

                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or update an integer preference.
    pub async fn set_preference(&self, key: &str, value: i64) -> Result<(), Error> {
        let key = key.to_string();
        let updated_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO preferences (key, value, updated_at) VALUES (?1, ?2, ?3)
                    ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        updated_at = excluded.updated_at",
                    params![key, value, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
