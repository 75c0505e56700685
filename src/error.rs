//! Error types and handling for the portfolio backend

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Application error taxonomy
///
/// Validation, not-found and authorization failures are client errors and
/// carry a descriptive message. Upstream failures (object storage, mailer,
/// page fetch) are server errors and must not corrupt committed state.
/// Cache failures never surface to callers; the variant exists so the cache
/// layer can log and swallow them.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code included in error responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::Upstream(_) => "upstream_failure",
            AppError::Timeout(_) => "timeout",
            AppError::Cache(_) => "cache_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Cache(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.error_code(),
            "message": self.to_string(),
        }));
        (self.status_code(), body).into_response()
    }
}

/// Convert anyhow::Error to AppError
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Convert reqwest::Error to AppError
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            AppError::Upstream(err.to_string())
        } else {
            AppError::Internal(err.to_string())
        }
    }
}

/// Convert std::io::Error to AppError
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Normalize free text using Unicode NFKC and trim surrounding whitespace
pub fn normalize_text(text: &str) -> String {
    use unicode_normalization::UnicodeNormalization;
    text.nfkc().collect::<String>().trim().to_string()
}

/// Require a non-empty field, NFKC-normalized and trimmed
pub fn require_field(value: &str, field: &str) -> Result<String, AppError> {
    let normalized = normalize_text(value);
    if normalized.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("post".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Forbidden("bad key".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Timeout("fetch".into()).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::Upstream("fetch".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_not_found_distinct_from_forbidden() {
        // deleteKey mismatch and missing comment must be distinguishable
        assert_ne!(
            AppError::NotFound("comment".into()).error_code(),
            AppError::Forbidden("invalid delete key".into()).error_code()
        );
    }

    #[test]
    fn test_require_field() {
        assert!(require_field("  ", "title").is_err());
        assert_eq!(require_field(" hi ", "title").unwrap(), "hi");
        // compatibility forms normalize before storage
        assert_eq!(require_field("ｈｅｌｌｏ", "title").unwrap(), "hello");
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  hello world  "), "hello world");
    }
}
