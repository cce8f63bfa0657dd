//! Product routes backed by PostgreSQL

use axum::Router;
use domain_catalog::{PgCategoryRepository, PgProductRepository, ProductService, handlers};

use crate::state::AppState;

pub fn router(state: &AppState) -> Router {
    let service = ProductService::new(
        PgProductRepository::new(state.db.clone()),
        PgCategoryRepository::new(state.db.clone()),
    );
    handlers::router(service, state.jwt.clone())
}
