use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::page::{PageRequest, PageRequestError, Sort};

/// Rejects names made only of whitespace
fn validate_not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank")
            .with_message("must not be blank".into()));
    }
    Ok(())
}

/// Category entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Product entity
///
/// `id` is `None` until the product has been persisted. `categories` keeps
/// the order in which they were attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image_url: String,
    pub date: DateTime<Utc>,
    pub categories: Vec<Category>,
}

/// Category reference inside a product payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryDto {
    #[schema(example = 2)]
    pub id: i64,
    /// Ignored on input
    #[serde(default)]
    #[schema(example = "Electronics")]
    pub name: String,
}

impl From<Category> for CategoryDto {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
        }
    }
}

/// Product payload for reads and writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    /// Assigned by the server; ignored on input
    #[serde(default)]
    #[schema(example = 1)]
    pub id: Option<i64>,

    #[validate(
        length(min = 3, max = 80, message = "must have between 3 and 80 characters"),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "The Lord of the Rings")]
    pub name: String,

    #[validate(length(min = 1, message = "is required"))]
    pub description: String,

    #[validate(range(min = 0.0, message = "must be zero or positive"))]
    #[schema(example = 90.5)]
    pub price: f64,

    #[serde(default)]
    #[validate(length(max = 2048))]
    pub image_url: String,

    pub date: DateTime<Utc>,

    #[serde(default)]
    pub categories: Vec<CategoryDto>,
}

impl ProductDto {
    /// Category ids to attach, first occurrence wins.
    pub fn category_ids(&self) -> Vec<i64> {
        let mut ids = Vec::with_capacity(self.categories.len());
        for category in &self.categories {
            if !ids.contains(&category.id) {
                ids.push(category.id);
            }
        }
        ids
    }

    /// Scalar fields of this payload on top of `id` and the resolved categories.
    pub fn into_product(self, id: Option<i64>, categories: Vec<Category>) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            image_url: self.image_url,
            date: self.date,
            categories,
        }
    }
}

impl From<Product> for ProductDto {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            image_url: product.image_url,
            date: product.date,
            categories: product.categories.into_iter().map(CategoryDto::from).collect(),
        }
    }
}

fn default_size() -> u64 {
    PageRequest::DEFAULT_SIZE
}

/// Query string of the product listing
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Only products in this category; 0 or absent lists every category
    #[serde(default)]
    pub category_id: i64,
    /// Case-insensitive substring of the product name
    #[serde(default)]
    pub name: String,
    /// Zero-based page index
    #[serde(default)]
    pub page: u64,
    /// Page size, 1 to 100
    #[serde(default = "default_size")]
    #[param(default = 20, minimum = 1, maximum = 100)]
    pub size: u64,
    /// `field` or `field,asc|desc` with field one of id, name, price, date
    #[param(example = "name,desc")]
    pub sort: Option<String>,
}

impl ProductQuery {
    pub fn page_request(&self) -> Result<PageRequest, PageRequestError> {
        let sort = match self.sort.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw.parse::<Sort>()?,
            _ => Sort::default(),
        };
        Ok(PageRequest::new(self.page, self.size)?.with_sort(sort))
    }
}
