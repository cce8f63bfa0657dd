//! Error codes carried in every [`ErrorResponse`](super::ErrorResponse).
//!
//! Each code has a client-facing identifier, an integer for logs and
//! dashboards, and a default message.
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::InvalidId;
//! assert_eq!(code.as_str(), "INVALID_ID");
//! assert_eq!(code.code(), 1002);
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000-1999)
    ValidationError,
    /// Path id is not a positive integer
    InvalidId,
    /// Body could not be parsed as the expected JSON
    JsonExtraction,
    /// Query string could not be parsed
    InvalidQuery,
    NotFound,
    Unauthorized,
    /// The request collides with data that references the target
    Conflict,
    MethodNotAllowed,

    // Server errors (1100-1199)
    InternalError,
    ServiceUnavailable,

    // Database errors (2000-2999)
    DatabaseError,
    DatabasePoolTimeout,
    DatabaseConnection,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidId => "INVALID_ID",
            Self::JsonExtraction => "JSON_EXTRACTION",
            Self::InvalidQuery => "INVALID_QUERY",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Conflict => "CONFLICT",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::DatabasePoolTimeout => "DATABASE_POOL_TIMEOUT",
            Self::DatabaseConnection => "DATABASE_CONNECTION",
        }
    }

    /// Integer code for structured logs:
    /// - 1000-1099: client errors
    /// - 1100-1199: server errors
    /// - 2000-2999: database errors
    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::InvalidId => 1002,
            Self::JsonExtraction => 1003,
            Self::InvalidQuery => 1004,
            Self::NotFound => 1005,
            Self::Unauthorized => 1006,
            Self::Conflict => 1008,
            Self::MethodNotAllowed => 1009,

            Self::InternalError => 1101,
            Self::ServiceUnavailable => 1102,

            Self::DatabaseError => 2001,
            Self::DatabasePoolTimeout => 2002,
            Self::DatabaseConnection => 2003,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::InvalidId => "Invalid id format",
            Self::JsonExtraction => "Failed to parse request body",
            Self::InvalidQuery => "Invalid query parameters",
            Self::NotFound => "Resource not found",
            Self::Unauthorized => "Authentication required",
            Self::Conflict => "Resource is referenced by other records",
            Self::MethodNotAllowed => "The HTTP method is not allowed for this resource",
            Self::InternalError => "An internal server error occurred",
            Self::ServiceUnavailable => "Service is temporarily unavailable",
            Self::DatabaseError => "Database error occurred",
            Self::DatabasePoolTimeout => "Database connection pool timed out",
            Self::DatabaseConnection => "Database is unreachable",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_integer_ranges() {
        assert_eq!(ErrorCode::ValidationError.code(), 1001);
        assert_eq!(ErrorCode::Conflict.code(), 1008);
        assert_eq!(ErrorCode::InternalError.code(), 1101);
        assert_eq!(ErrorCode::DatabaseError.code(), 2001);
    }

    #[test]
    fn test_error_code_display_matches_serde() {
        for code in [
            ErrorCode::InvalidId,
            ErrorCode::InvalidQuery,
            ErrorCode::DatabasePoolTimeout,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code));
        }
    }

    #[test]
    fn test_error_code_deserialization() {
        let code: ErrorCode = serde_json::from_str("\"NOT_FOUND\"").unwrap();
        assert_eq!(code, ErrorCode::NotFound);
        assert_eq!(code.default_message(), "Resource not found");
    }
}
