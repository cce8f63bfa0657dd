use axum::{
    Extension, Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::LOCATION},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_helpers::{
    AppError, AuditEvent, AuditOutcome, IdPath, JwtAuth, JwtClaims, QueryParams, ValidatedJson,
    errors::responses::{
        BadRequestIdResponse, BadRequestQueryResponse, BadRequestValidationResponse,
        ConflictResponse, InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
    jwt_auth_middleware,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{CatalogError, CatalogResult};
use crate::models::{CategoryDto, ProductDto, ProductQuery};
use crate::page::Page;
use crate::repository::{CategoryRepository, ProductRepository};
use crate::service::ProductService;

/// Mount point of the product routes below `/api`
pub const URL: &str = "/products";
pub const TAG: &str = "products";

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation for the Products API
#[derive(OpenApi)]
#[openapi(
    paths(list_products, create_product, get_product, update_product, delete_product),
    components(
        schemas(ProductDto, CategoryDto),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestIdResponse,
            BadRequestQueryResponse,
            UnauthorizedResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = TAG, description = "Product catalog endpoints")
    )
)]
pub struct ApiDoc;

type SharedService<P, C> = Arc<ProductService<P, C>>;

/// Create the product router. Reads are public; writes need a bearer token.
pub fn router<P, C>(service: ProductService<P, C>, auth: JwtAuth) -> Router
where
    P: ProductRepository + 'static,
    C: CategoryRepository + 'static,
{
    let shared_service = Arc::new(service);
    let require_auth = middleware::from_fn_with_state(auth, jwt_auth_middleware);

    Router::new()
        .route(
            "/",
            get(list_products).merge(post(create_product).route_layer(require_auth.clone())),
        )
        .route(
            "/{id}",
            get(get_product).merge(
                put(update_product)
                    .delete(delete_product)
                    .route_layer(require_auth),
            ),
        )
        .with_state(shared_service)
}

/// List products, optionally filtered by category and name
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(ProductQuery),
    responses(
        (status = 200, description = "Page of products", body = Page<ProductDto>),
        (status = 400, response = BadRequestQueryResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<P: ProductRepository, C: CategoryRepository>(
    State(service): State<SharedService<P, C>>,
    QueryParams(query): QueryParams<ProductQuery>,
) -> Result<Json<Page<ProductDto>>, AppError> {
    let page = query
        .page_request()
        .map_err(|e| AppError::InvalidQuery(e.to_string()))?;

    let products = service
        .find_all_paged(query.category_id, &query.name, page)
        .await?;
    Ok(Json(products))
}

/// Create a product
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = ProductDto,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Product created", body = ProductDto,
            headers(("Location" = String, description = "URL of the new product"))),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<P: ProductRepository, C: CategoryRepository>(
    State(service): State<SharedService<P, C>>,
    Extension(claims): Extension<JwtClaims>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<ProductDto>,
) -> CatalogResult<impl IntoResponse> {
    let product = service.insert(input).await?;
    let id = product.id.unwrap_or_default();

    AuditEvent::new("product.create", format!("product:{}", id), AuditOutcome::Success)
        .with_user(claims.principal())
        .with_request(&headers)
        .with_details(json!({
            "name": product.name,
            "price": product.price,
            "categories": product.categories.iter().map(|c| c.id).collect::<Vec<_>>(),
        }))
        .log();

    let location = format!("/api{}/{}", URL, id);
    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(product)))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = ProductDto),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<P: ProductRepository, C: CategoryRepository>(
    State(service): State<SharedService<P, C>>,
    IdPath(id): IdPath,
) -> CatalogResult<Json<ProductDto>> {
    let product = service.find_by_id(id).await?;
    Ok(Json(product))
}

/// Replace a product's fields and categories
#[utoipa::path(
    put,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    request_body = ProductDto,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Product updated", body = ProductDto),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<P: ProductRepository, C: CategoryRepository>(
    State(service): State<SharedService<P, C>>,
    IdPath(id): IdPath,
    Extension(claims): Extension<JwtClaims>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<ProductDto>,
) -> CatalogResult<Json<ProductDto>> {
    let product = service.update(id, input).await?;

    AuditEvent::new("product.update", format!("product:{}", id), AuditOutcome::Success)
        .with_user(claims.principal())
        .with_request(&headers)
        .with_details(json!({ "name": product.name, "price": product.price }))
        .log();

    Ok(Json(product))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 400, response = BadRequestIdResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<P: ProductRepository, C: CategoryRepository>(
    State(service): State<SharedService<P, C>>,
    IdPath(id): IdPath,
    Extension(claims): Extension<JwtClaims>,
    headers: HeaderMap,
) -> CatalogResult<StatusCode> {
    let result = service.delete(id).await;

    let outcome = match &result {
        Ok(()) => AuditOutcome::Success,
        Err(_) => AuditOutcome::Failure,
    };
    let mut event = AuditEvent::new("product.delete", format!("product:{}", id), outcome)
        .with_user(claims.principal())
        .with_request(&headers);
    if let Err(CatalogError::DataBase(reason)) = &result {
        event = event.with_details(json!({ "reason": reason }));
    }
    event.log();

    result.map(|()| StatusCode::NO_CONTENT)
}
