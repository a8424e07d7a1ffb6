//! Result and error types for the core library

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core library error type
///
/// A blocked save or AI use is not an error; those surface as
/// [`SaveOutcome::Blocked`](crate::domain::SaveOutcome) and
/// [`AiOutcome::Blocked`](crate::domain::AiOutcome).
#[derive(Error, Debug)]
pub enum Error {
    /// Identity has not been established yet (auth still bootstrapping or signed out)
    #[error("App not ready to save items. Please try again.")]
    NotReady,

    #[error("Failed to persist '{key}': {reason}")]
    Persistence { key: String, reason: String },

    #[error("Corrupt persisted state under '{key}': {reason}")]
    CorruptState { key: String, reason: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a persistence error for a storage key
    pub fn persistence(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::Persistence {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a corrupt-state error for a storage key
    pub fn corrupt(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::CorruptState {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether the UI should defer (show a loading state) instead of reporting a failure
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady)
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result with optional context (for JSON output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: None,
        }
    }

    /// Create a successful result with context
    pub fn ok_with_context(data: T, context: HashMap<String, serde_json::Value>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: Some(context),
        }
    }

    /// Create a failed result
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            context: None,
        }
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_result_ok() {
        let result: OperationResult<i32> = OperationResult::ok(42);
        assert!(result.success);
        assert_eq!(result.data, Some(42));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_operation_result_fail() {
        let result: OperationResult<i32> = OperationResult::fail("Something went wrong");
        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.error, Some("Something went wrong".to_string()));
    }

    #[test]
    fn test_from_result() {
        let err: Result<i32> = Err(Error::persistence("savedItems:u1", "disk full"));
        let result: OperationResult<i32> = err.into();
        assert!(!result.success);
        let message = result.error.unwrap();
        assert!(message.contains("savedItems:u1"));
        assert!(message.contains("disk full"));
    }

    #[test]
    fn test_not_ready_is_deferrable() {
        assert!(Error::NotReady.is_not_ready());
        assert!(!Error::validation("bad").is_not_ready());
    }
}
