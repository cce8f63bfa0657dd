//! Extractors that reject with [`AppError`](crate::errors::AppError) so every
//! client mistake gets the shared JSON error body.

pub mod id_path;
pub mod query;
pub mod validated_json;

pub use id_path::IdPath;
pub use query::QueryParams;
pub use validated_json::ValidatedJson;
