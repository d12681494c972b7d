//! Storage error model.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError | Scenario |
//! |------------|------------|----------|
//! | Database | `Database` | Constraint violation, missing table, bad SQL |
//! | PoolClosed / PoolTimedOut / Io / Tls | `Unavailable` | Store cannot be reached |
//! | ColumnDecode / Decode / TypeNotFound | `Decode` | Stored value has an unexpected type |
//! | Other | `Database` | Anything else |

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("decode error: {0}")]
    Decode(String),
}

pub(crate) fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::Database {
            operation,
            message: match db_err.code() {
                Some(code) => format!("{} (code {code})", db_err.message()),
                None => db_err.message().to_string(),
            },
        },
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("timed out acquiring a connection in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {operation}: {e}")),
        sqlx::Error::Tls(e) => StoreError::Unavailable(format!("tls error in {operation}: {e}")),
        sqlx::Error::ColumnDecode { index, source } => {
            StoreError::Decode(format!("column {index} in {operation}: {source}"))
        }
        sqlx::Error::Decode(e) => StoreError::Decode(format!("{operation}: {e}")),
        sqlx::Error::TypeNotFound { type_name } => {
            StoreError::Decode(format!("{operation}: type not found: {type_name}"))
        }
        other => StoreError::Database {
            operation,
            message: other.to_string(),
        },
    }
}
