//! Country table operations.
//!
//! The table is only ever replaced wholesale, either atomically through
//! `replace_all` or as `delete_all_countries` followed by `insert_all`. Row ids
//! come from SQLite's AUTOINCREMENT and are returned in input order.

use super::connection::CountryDb;
use crate::Error;
use crate::country::Country;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

const SELECT_COLUMNS: &str =
    "SELECT uuid, name, code, capital, region, currency, language, population, flag_url FROM countries";

fn country_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Country> {
    Ok(Country {
        uuid: Some(row.get(0)?),
        name: row.get(1)?,
        code: row.get(2)?,
        capital: row.get(3)?,
        region: row.get(4)?,
        currency: row.get(5)?,
        language: row.get(6)?,
        population: row.get(7)?,
        flag_url: row.get(8)?,
    })
}

fn insert_rows(tx: &rusqlite::Transaction<'_>, countries: &[Country]) -> rusqlite::Result<Vec<i64>> {
    let mut stmt = tx.prepare(
        "INSERT INTO countries (name, code, capital, region, currency, language, population, flag_url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    let mut ids = Vec::with_capacity(countries.len());
    for country in countries {
        ids.push(stmt.insert(params![
            &country.name,
            &country.code,
            &country.capital,
            &country.region,
            &country.currency,
            &country.language,
            &country.population,
            &country.flag_url,
        ])?);
    }
    Ok(ids)
}

impl CountryDb {
    /// Load every persisted country, ordered by row id.
    pub async fn get_all_countries(&self) -> Result<Vec<Country>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<Country>, Error> {
                let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY uuid ASC"))?;
                let countries = stmt
                    .query_map([], country_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(countries)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every country row.
    ///
    /// Returns the number of deleted rows.
    pub async fn delete_all_countries(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM countries", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Insert all countries in a single transaction.
    ///
    /// Returns the assigned row ids, one per input record, in input order.
    /// Any `uuid` already set on the inputs is ignored.
    pub async fn insert_all(&self, countries: &[Country]) -> Result<Vec<i64>, Error> {
        let countries = countries.to_vec();
        self.conn
            .call(move |conn| -> Result<Vec<i64>, Error> {
                let tx = conn.transaction()?;
                let ids = insert_rows(&tx, &countries)?;
                tx.commit()?;
                Ok(ids)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every row and insert `countries` in one transaction.
    ///
    /// Either the whole new list is stored or the old rows are kept. Returns
    /// the deleted row count and the new ids in input order.
    pub async fn replace_all(&self, countries: &[Country]) -> Result<(u64, Vec<i64>), Error> {
        let countries = countries.to_vec();
        self.conn
            .call(move |conn| -> Result<(u64, Vec<i64>), Error> {
                let tx = conn.transaction()?;
                let deleted = tx.execute("DELETE FROM countries", [])? as u64;
                let ids = insert_rows(&tx, &countries)?;
                tx.commit()?;
                Ok((deleted, ids))
            })
            .await
            .map_err(Error::from)
    }

    /// Number of cached countries.
    pub async fn count_countries(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM countries", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
