//! Error types for conform

use std::backtrace::Backtrace;
use thiserror::Error;

/// Result type alias for conform operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for persistence operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A prepared statement failed to bind or execute.
    ///
    /// `params` holds the statement's parameter dump and `trace` the call stack
    /// captured at the point of failure.
    #[error("Statement execution failed: {message}")]
    Execution {
        sql: String,
        params: String,
        message: String,
        trace: String,
    },

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// SQLite driver error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// PostgreSQL driver error
    #[error("Query error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an execution error, capturing the current call stack.
    ///
    /// The trace is only populated when `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE` enable it.
    pub fn execution(
        sql: impl Into<String>,
        params: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Execution {
            sql: sql.into(),
            params: params.into(),
            message: message.into(),
            trace: Backtrace::capture().to_string(),
        }
    }

    /// Check if this is a statement execution error
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution { .. })
    }

    /// Check if this is a connection error
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Structured failure payload for the top-level application to emit.
    ///
    /// ```ignore
    /// if let Err(e) = orm.persist(&user) {
    ///     eprintln!("{}", e.failure_payload());
    ///     std::process::exit(1);
    /// }
    /// ```
    pub fn failure_payload(&self) -> serde_json::Value {
        let mut payload = serde_json::json!({
            "outcome": false,
            "message": self.to_string(),
        });
        if let Self::Execution { params, .. } = self {
            payload["params"] = serde_json::Value::String(params.clone());
        }
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_payload_reports_outcome_false() {
        let err = OrmError::Connection("refused".into());
        let payload = err.failure_payload();
        assert_eq!(payload["outcome"], serde_json::Value::Bool(false));
        assert_eq!(payload["message"], "Connection error: refused");
        assert!(payload.get("params").is_none());
    }

    #[test]
    fn execution_payload_carries_param_dump() {
        let err = OrmError::execution("DELETE FROM user WHERE id = ?", "?1 = Integer(3)", "locked");
        assert!(err.is_execution());
        assert!(!err.is_connection());
        let payload = err.failure_payload();
        assert_eq!(payload["params"], "?1 = Integer(3)");
        assert_eq!(payload["message"], "Statement execution failed: locked");
    }
}
