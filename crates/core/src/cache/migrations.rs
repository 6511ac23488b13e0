//! Versioned schema migrations.
//!
//! Applied versions are recorded in `_migrations`. Each pending migration
//! runs in its own transaction together with its version row, so a failing
//! batch leaves the schema at the last complete version.

use super::Error;
use tokio_rusqlite::rusqlite::{self, Transaction};
use tokio_rusqlite::{Connection, params};

/// One schema step.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

/// Schema history, strictly ascending by version.
pub const MIGRATIONS: &[Migration] = &[
    Migration { version: 1, name: "countries", sql: include_str!("../../migrations/001_countries.sql") },
    Migration { version: 2, name: "preferences", sql: include_str!("../../migrations/002_preferences.sql") },
];

const VERSION_TABLE: &str = "CREATE TABLE IF NOT EXISTS _migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
)";

/// Bring the schema up to the latest version.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    apply(conn, MIGRATIONS).await
}

/// Apply every migration newer than the recorded schema version.
///
/// # Errors
///
/// Returns `MigrationFailed` naming the first migration whose batch failed.
/// Migrations before it stay applied; nothing of the failed one remains.
pub async fn apply(conn: &Connection, migrations: &'static [Migration]) -> Result<(), Error> {
    conn.call(move |conn| -> Result<(), Error> {
        conn.execute(VERSION_TABLE, [])?;
        let current = current_version(conn)?;

        for migration in migrations.iter().filter(|m| m.version > current) {
            let tx = conn.transaction()?;
            apply_one(&tx, migration).map_err(|e| {
                Error::MigrationFailed(format!("{} ({}): {e}", migration.version, migration.name))
            })?;
            tx.commit()?;
            tracing::debug!(version = migration.version, name = migration.name, "applied migration");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

fn current_version(conn: &rusqlite::Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))
}

fn apply_one(tx: &Transaction<'_>, migration: &Migration) -> rusqlite::Result<()> {
    tx.execute_batch(migration.sql)?;
    tx.execute(
        "INSERT INTO _migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
        params![migration.version, migration.name, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn table_exists(conn: &Connection, name: &'static str) -> bool {
        conn.call(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1)",
                params![name],
                |row| row.get(0),
            )
        })
        .await
        .unwrap()
    }

    async fn recorded_version(conn: &Connection) -> i64 {
        conn.call(|conn| current_version(conn)).await.unwrap()
    }

    #[test]
    fn test_versions_strictly_ascending() {
        assert!(MIGRATIONS.windows(2).all(|w| w[0].version < w[1].version));
        assert_eq!(MIGRATIONS[0].version, 1);
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        assert!(table_exists(&conn, "countries").await);
        assert!(table_exists(&conn, "preferences").await);
        assert_eq!(recorded_version(&conn).await, 2);
    }

    #[tokio::test]
    async fn test_one_row_per_migration() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();

        let names: Vec<String> = conn
            .call(|conn| -> rusqlite::Result<Vec<String>> {
                let mut stmt = conn.prepare("SELECT name FROM _migrations ORDER BY version")?;
                let names = stmt.query_map([], |row| row.get(0))?.collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .unwrap();

        assert_eq!(names, ["countries", "preferences"]);
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_no_partial_schema() {
        static BROKEN: &[Migration] = &[
            Migration { version: 1, name: "alpha", sql: "CREATE TABLE alpha (id INTEGER PRIMARY KEY);" },
            Migration {
                version: 2,
                name: "beta",
                sql: "CREATE TABLE beta (id INTEGER PRIMARY KEY); INSERT INTO missing_table VALUES (1);",
            },
        ];

        let conn = Connection::open_in_memory().await.unwrap();
        let result = apply(&conn, BROKEN).await;

        assert!(matches!(result, Err(Error::MigrationFailed(ref msg)) if msg.contains("beta")));
        assert!(table_exists(&conn, "alpha").await);
        assert!(!table_exists(&conn, "beta").await);
        assert_eq!(recorded_version(&conn).await, 1);
    }

    #[tokio::test]
    async fn test_resumes_after_recorded_version() {
        static FIRST: &[Migration] = &[Migration { version: 1, name: "a", sql: "CREATE TABLE a (id INTEGER);" }];
        static BOTH: &[Migration] = &[
            Migration { version: 1, name: "a", sql: "CREATE TABLE a (id INTEGER);" },
            Migration { version: 2, name: "b", sql: "CREATE TABLE b (id INTEGER);" },
        ];

        let conn = Connection::open_in_memory().await.unwrap();
        apply(&conn, FIRST).await.unwrap();
        // re-running version 1 would fail on the existing table
        apply(&conn, BOTH).await.unwrap();

        assert!(table_exists(&conn, "b").await);
        assert_eq!(recorded_version(&conn).await, 2);
    }
}
