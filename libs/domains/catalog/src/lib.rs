//! Catalog Domain
//!
//! Products, the categories they belong to, and the paged product search.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← /products endpoints, bearer auth on writes
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← ProductService: validation, category resolution, error mapping
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← ProductRepository / CategoryRepository (Postgres + in-memory)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Product, Category, ProductDto, Page
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum_helpers::{JwtAuth, JwtConfig};
//! use domain_catalog::{
//!     handlers,
//!     repository::{InMemoryCategoryRepository, InMemoryProductRepository},
//!     service::ProductService,
//! };
//!
//! let service = ProductService::new(
//!     InMemoryProductRepository::new(),
//!     InMemoryCategoryRepository::new(),
//! );
//! let auth = JwtAuth::new(&JwtConfig::new("a-secret-of-at-least-thirty-two-chars"));
//!
//! let router = handlers::router(service, auth);
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod page;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{CatalogError, CatalogResult, StoreError, StoreResult};
pub use models::{Category, CategoryDto, Product, ProductDto, ProductQuery};
pub use page::{Direction, Page, PageRequest, PageRequestError, Sort, SortField};
pub use postgres::{PgCategoryRepository, PgProductRepository};
pub use repository::{
    CategoryRepository, InMemoryCategoryRepository, InMemoryProductRepository, ProductRepository,
};
pub use service::ProductService;
