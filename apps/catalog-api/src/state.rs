//! Application state management

use axum_helpers::JwtAuth;
use sea_orm::DatabaseConnection;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    pub db: DatabaseConnection,
    pub jwt: JwtAuth,
}

impl AppState {
    pub fn new(config: crate::config::Config, db: DatabaseConnection) -> Self {
        let jwt = JwtAuth::new(&config.jwt);
        Self { config, db, jwt }
    }
}
