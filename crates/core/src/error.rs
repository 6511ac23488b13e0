//! Unified error types for globe.
//!
//! Display strings carry a stable uppercase code prefix so log lines can be
//! grepped by failure class.

use tokio_rusqlite::rusqlite;

/// Unified error type shared by the store, the client and the coordinator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Database failure reported by tokio-rusqlite in a form without its own variant.
    #[error("CACHE_ERROR: {0}")]
    Storage(String),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// The store returned a different number of row ids than records inserted.
    #[error("IDENTIFIER_MISMATCH: inserted {expected} records but store returned {actual} ids")]
    IdentifierMismatch { expected: usize, actual: usize },

    /// Invalid endpoint URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// HTTP error response or transport failure.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Response body was not a valid country list.
    #[error("PARSE_ERROR: {0}")]
    Parse(String),

    /// The coordinator was disposed and accepts no more work.
    #[error("DISPOSED: refresh coordinator has been disposed")]
    Disposed,

    /// A background task panicked or was cancelled unexpectedly.
    #[error("TASK_FAILED: {0}")]
    TaskFailed(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            other => Error::Storage(other.to_string()),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::HttpError("status 503".to_string());
        assert!(err.to_string().contains("HTTP_ERROR"));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_identifier_mismatch_display() {
        let err = Error::IdentifierMismatch { expected: 3, actual: 2 };
        let msg = err.to_string();
        assert!(msg.starts_with("IDENTIFIER_MISMATCH"));
        assert!(msg.contains("3 records"));
        assert!(msg.contains("2 ids"));
    }

    #[test]
    fn test_inner_error_passes_through_connection_layer() {
        let err: Error = tokio_rusqlite::Error::Error(Error::IdentifierMismatch { expected: 2, actual: 1 }).into();
        assert!(matches!(err, Error::IdentifierMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_closed_connection_stays_closed() {
        let err: Error = tokio_rusqlite::Error::<Error>::ConnectionClosed.into();
        assert!(matches!(err, Error::Database(tokio_rusqlite::Error::ConnectionClosed)));
    }

    #[test]
    fn test_storage_error_keeps_message() {
        let err = Error::Storage("database is locked".into());
        assert_eq!(err.to_string(), "CACHE_ERROR: database is locked");
    }

    #[test]
    fn test_rusqlite_error_converts_to_database() {
        let err: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, Error::Database(_)));
        assert!(err.to_string().starts_with("CACHE_ERROR"));
    }
}
