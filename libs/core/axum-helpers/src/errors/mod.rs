pub mod codes;
pub mod handlers;
pub mod responses;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Body of every non-2xx response.
///
/// ```json
/// {
///   "code": 1005,
///   "error": "NOT_FOUND",
///   "message": "Id not found 1000",
///   "details": null
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Integer error code for logging and monitoring
    pub code: i32,
    /// Machine-readable error identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Structured details, e.g. validation errors keyed by field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Errors that handlers and extractors turn into HTTP responses.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
}

impl AppError {
    fn parts(self) -> (StatusCode, ErrorCode, String, Option<Value>) {
        match self {
            AppError::Database(e) => map_db_error(e),
            AppError::JsonExtractorRejection(e) => {
                tracing::info!(error_code = ErrorCode::JsonExtraction.code(), "JSON extraction error: {}", e);
                (e.status(), ErrorCode::JsonExtraction, e.body_text(), None)
            }
            AppError::ValidationError(e) => {
                tracing::info!(error_code = ErrorCode::ValidationError.code(), "Validation error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorCode::ValidationError,
                    ErrorCode::ValidationError.default_message().to_string(),
                    Some(validation_details(&e)),
                )
            }
            AppError::InvalidId(raw) => {
                tracing::info!(error_code = ErrorCode::InvalidId.code(), "Invalid id: {}", raw);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorCode::InvalidId,
                    format!("Invalid id: {}", raw),
                    None,
                )
            }
            AppError::InvalidQuery(msg) => {
                tracing::info!(error_code = ErrorCode::InvalidQuery.code(), "Invalid query: {}", msg);
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidQuery, msg, None)
            }
            AppError::BadRequest(msg) => {
                tracing::info!(error_code = ErrorCode::ValidationError.code(), "Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, ErrorCode::ValidationError, msg, None)
            }
            AppError::Unauthorized(msg) => {
                tracing::info!(error_code = ErrorCode::Unauthorized.code(), "Unauthorized: {}", msg);
                (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, msg, None)
            }
            AppError::NotFound(msg) => {
                tracing::info!(error_code = ErrorCode::NotFound.code(), "Not found: {}", msg);
                (StatusCode::NOT_FOUND, ErrorCode::NotFound, msg, None)
            }
            AppError::Conflict(msg) => {
                tracing::info!(error_code = ErrorCode::Conflict.code(), "Conflict: {}", msg);
                (StatusCode::CONFLICT, ErrorCode::Conflict, msg, None)
            }
            AppError::InternalServerError(msg) => {
                tracing::error!(error_code = ErrorCode::InternalError.code(), "Internal server error: {}", msg);
                // The cause stays in the logs.
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalError,
                    ErrorCode::InternalError.default_message().to_string(),
                    None,
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();
        error_response(status, code, message, details)
    }
}

fn map_db_error(error: DbErr) -> (StatusCode, ErrorCode, String, Option<Value>) {
    let (status, code) = match &error {
        DbErr::ConnectionAcquire(_) => (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::DatabasePoolTimeout),
        DbErr::Conn(_) => (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::DatabaseConnection),
        DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DatabaseError),
    };

    if status.is_server_error() {
        tracing::error!(error_code = code.code(), "Database error: {:?}", error);
    } else {
        tracing::info!(error_code = code.code(), "Database lookup failed: {}", error);
    }

    (status, code, code.default_message().to_string(), None)
}

/// Flattens `ValidationErrors` into `{ field: [{ code, message, params }] }`.
pub fn validation_details(errors: &ValidationErrors) -> Value {
    let fields = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let entries: Vec<Value> = errors
                .iter()
                .map(|err| {
                    serde_json::json!({
                        "code": err.code,
                        "message": err.message,
                        "params": err.params,
                    })
                })
                .collect();
            (field.to_string(), Value::Array(entries))
        })
        .collect::<serde_json::Map<_, _>>();

    Value::Object(fields)
}

/// Builds the JSON error body for `status`.
pub fn error_response(
    status: StatusCode,
    code: ErrorCode,
    message: String,
    details: Option<Value>,
) -> Response {
    let body = Json(ErrorResponse {
        code: code.code(),
        error: code.as_str().to_string(),
        message,
        details,
    });

    (status, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use validator::Validate;

    async fn body_of(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[derive(Validate)]
    struct Named {
        #[validate(length(min = 3))]
        name: String,
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let response = AppError::NotFound("Id not found 1000".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_of(response).await;
        assert_eq!(body["code"], 1005);
        assert_eq!(body["error"], "NOT_FOUND");
        assert_eq!(body["message"], "Id not found 1000");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_conflict_status() {
        let response = AppError::Conflict("Integrity violation".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_of(response).await["error"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_validation_details_are_keyed_by_field() {
        let errors = Named { name: "ab".into() }.validate().unwrap_err();
        let response = AppError::from(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_of(response).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert_eq!(body["details"]["name"][0]["code"], "length");
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let response = AppError::InternalServerError("connection reset by peer".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await["message"], "An internal server error occurred");
    }

    #[tokio::test]
    async fn test_db_error_mapping() {
        let response = AppError::from(DbErr::Custom("boom".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await["error"], "DATABASE_ERROR");

        let response = AppError::from(DbErr::RecordNotFound("products".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
