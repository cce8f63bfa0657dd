use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Outcome of a failed repository call
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    EntityNotFound { entity: &'static str, id: i64 },

    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    #[error(transparent)]
    Db(DbErr),
}

pub type StoreResult<T> = Result<T, StoreError>;

// Foreign-key violations mean another row still points at the one being written.
impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                StoreError::IntegrityViolation(detail)
            }
            _ => StoreError::Db(err),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    ResourceNotFound(String),

    #[error("{0}")]
    DataBase(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CatalogError {
    pub fn id_not_found(id: i64) -> Self {
        CatalogError::ResourceNotFound(format!("Id not found {}", id))
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Convert CatalogError to AppError for standardized error responses
impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::ResourceNotFound(msg) => AppError::NotFound(msg),
            CatalogError::DataBase(msg) => AppError::Conflict(msg),
            CatalogError::Validation(msg) => AppError::BadRequest(msg),
            CatalogError::Store(StoreError::Db(e)) => AppError::Database(e),
            CatalogError::Store(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
