//! Catalog API - product and category REST server

use axum_helpers::server::{create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use tracing::{info, warn};

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(app = config.app.name, version = config.app.version, "Starting");

    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    if config.run_migrations {
        database::postgres::run_migrations::<migration::Migrator>(&db, config.app.name).await?;
    } else {
        info!("RUN_MIGRATIONS=false, skipping migrations");
    }

    let state = AppState::new(config, db);

    let api_routes = api::routes(&state);
    let app = create_router::<openapi::ApiDoc>(api_routes, &state.config.cors)
        .merge(health_router(state.config.app.clone()))
        .merge(api::ready_router(state.clone()));

    let db = state.db.clone();
    create_production_app(app, &state.config.server, async move {
        info!("Closing PostgreSQL pool");
        if let Err(e) = db.close().await {
            warn!("Failed to close PostgreSQL pool: {}", e);
        }
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Catalog API shutdown complete");
    Ok(())
}
