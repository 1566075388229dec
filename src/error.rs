//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Errors returned at the cache call boundary.
///
/// Operational failures of the durable medium never show up here; those
/// are logged and degraded to a miss inside the durable tier.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not present in either tier
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key is empty or too long
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// TTL must be strictly positive
    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),

    /// A cache operation could not run to completion (worker task failed)
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidKey(_) | CacheError::InvalidTtl(_) => StatusCode::BAD_REQUEST,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Medium Error Enum ==
/// Failures reported by a durable storage medium.
#[derive(Error, Debug)]
pub enum MediumError {
    /// Underlying filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Write rejected because it would exceed the medium's quota
    #[error("Quota exceeded: needed {needed} bytes, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    /// Medium cannot be used at all (disabled, poisoned lock, ...)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (CacheError::NotFound("k".into()), StatusCode::NOT_FOUND),
            (CacheError::InvalidKey("k".into()), StatusCode::BAD_REQUEST),
            (CacheError::InvalidTtl("0".into()), StatusCode::BAD_REQUEST),
            (
                CacheError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_quota_message() {
        let err = MediumError::QuotaExceeded {
            needed: 10,
            available: 4,
        };
        assert_eq!(
            err.to_string(),
            "Quota exceeded: needed 10 bytes, 4 available"
        );
    }
}
