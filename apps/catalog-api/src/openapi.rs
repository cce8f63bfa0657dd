//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for the Catalog API
#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse, axum_helpers::HealthResponse)
    ),
    info(
        title = "Catalog API",
        version = "0.1.0",
        description = "Product catalog with categories. Reads are public, writes need a bearer token."
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = domain_catalog::handlers::URL, api = domain_catalog::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;
