//! Readiness check with a real database round trip.

use crate::state::AppState;
use axum::{extract::State, response::Response};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};

pub async fn ready_handler(State(state): State<AppState>) -> Response {
    let database: HealthCheckFuture<'_> = Box::pin(async {
        database::postgres::check_health(&state.db)
            .await
            .map_err(|e| format!("Database ping failed: {}", e))
    });

    run_health_checks(vec![("database", database)]).await
}
