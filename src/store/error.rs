//! Failure taxonomy for the persistence engine.

use thiserror::Error;

/// Failures raised by the persistence engine.
///
/// Every variant keeps the underlying cause so the message surfaced at the
/// API boundary names what actually went wrong.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database file could not be opened or the pool could not connect.
    #[error("database connection failed: {0}")]
    Connection(#[source] sqlx::Error),

    /// Creating the registered tables failed.
    #[error("schema creation failed: {0}")]
    Schema(#[source] sqlx::Error),

    /// An insert, update, or delete failed; the transaction was rolled back.
    #[error("write failed: {0}")]
    Write(#[source] sqlx::Error),

    /// A filter, ordering, or table reference did not validate against the
    /// schema registry, or a read failed mid-flight.
    #[error("query failed: {message}")]
    Query {
        message: String,
        #[source]
        source: Option<sqlx::Error>,
    },
}

impl StoreError {
    /// A validation failure caught before any SQL was assembled.
    pub(crate) fn query(message: impl Into<String>) -> Self {
        StoreError::Query {
            message: message.into(),
            source: None,
        }
    }

    /// A read that failed after validation passed.
    pub(crate) fn query_fault(source: sqlx::Error) -> Self {
        StoreError::Query {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Stable numeric classification, logged alongside the message.
    pub fn code(&self) -> u16 {
        match self {
            StoreError::Connection(_) => 1,
            StoreError::Schema(_) => 2,
            StoreError::Write(_) => 3,
            StoreError::Query { .. } => 4,
        }
    }

    /// True when the underlying failure is a uniqueness-constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StoreError::Write(sqlx::Error::Database(db)) => {
                db.message().contains("UNIQUE constraint failed")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_per_kind() {
        assert_eq!(StoreError::query("x").code(), 4);
        assert_eq!(StoreError::Write(sqlx::Error::PoolClosed).code(), 3);
        assert_eq!(StoreError::Schema(sqlx::Error::PoolClosed).code(), 2);
        assert_eq!(StoreError::Connection(sqlx::Error::PoolClosed).code(), 1);
    }

    #[test]
    fn query_message_is_carried_verbatim() {
        let err = StoreError::query("unknown column \"height\" on table \"people\"");
        assert_eq!(
            err.to_string(),
            "query failed: unknown column \"height\" on table \"people\""
        );
    }

    #[test]
    fn non_write_errors_are_never_unique_violations() {
        assert!(!StoreError::query("x").is_unique_violation());
        assert!(!StoreError::Connection(sqlx::Error::PoolClosed).is_unique_violation());
    }
}
