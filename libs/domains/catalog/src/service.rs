use std::sync::Arc;
use validator::Validate;

use crate::error::{CatalogError, CatalogResult, StoreError};
use crate::models::ProductDto;
use crate::page::{Page, PageRequest};
use crate::repository::{CategoryRepository, ProductRepository};

/// Service layer for the product catalog
///
/// Translates between transfer objects and entities and turns store
/// outcomes into [`CatalogError`]s. Holds no state of its own.
pub struct ProductService<P: ProductRepository, C: CategoryRepository> {
    products: Arc<P>,
    categories: Arc<C>,
}

impl<P: ProductRepository, C: CategoryRepository> Clone for ProductService<P, C> {
    fn clone(&self) -> Self {
        Self {
            products: Arc::clone(&self.products),
            categories: Arc::clone(&self.categories),
        }
    }
}

impl<P: ProductRepository, C: CategoryRepository> ProductService<P, C> {
    pub fn new(products: P, categories: C) -> Self {
        Self {
            products: Arc::new(products),
            categories: Arc::new(categories),
        }
    }

    /// Get a product with its categories
    #[tracing::instrument(skip(self))]
    pub async fn find_by_id(&self, id: i64) -> CatalogResult<ProductDto> {
        self.products
            .find_by_id(id)
            .await?
            .map(ProductDto::from)
            .ok_or_else(|| CatalogError::id_not_found(id))
    }

    /// List products; `category_id` 0 and an empty `name` disable their filters.
    #[tracing::instrument(skip(self))]
    pub async fn find_all_paged(
        &self,
        category_id: i64,
        name: &str,
        page: PageRequest,
    ) -> CatalogResult<Page<ProductDto>> {
        let category = (category_id > 0).then_some(category_id);
        let found = self.products.search(category, name.trim(), page).await?;
        Ok(found.map(ProductDto::from))
    }

    /// Create a product. An unknown category id is passed through as a
    /// store failure.
    #[tracing::instrument(skip(self, dto), fields(product_name = %dto.name))]
    pub async fn insert(&self, dto: ProductDto) -> CatalogResult<ProductDto> {
        dto.validate()
            .map_err(|e| CatalogError::Validation(e.to_string()))?;

        let categories = self.categories.get_references(dto.category_ids()).await?;
        let saved = self.products.save(dto.into_product(None, categories)).await?;

        tracing::info!(product_id = ?saved.id, "Created product");
        Ok(saved.into())
    }

    /// Overwrite every field of an existing product and replace its categories
    #[tracing::instrument(skip(self, dto))]
    pub async fn update(&self, id: i64, dto: ProductDto) -> CatalogResult<ProductDto> {
        dto.validate()
            .map_err(|e| CatalogError::Validation(e.to_string()))?;

        if !self.products.exists(id).await? {
            return Err(CatalogError::id_not_found(id));
        }

        let missing = |e: StoreError| match e {
            StoreError::EntityNotFound { .. } => CatalogError::id_not_found(id),
            other => other.into(),
        };

        let categories = self
            .categories
            .get_references(dto.category_ids())
            .await
            .map_err(missing)?;
        let saved = self
            .products
            .save(dto.into_product(Some(id), categories))
            .await
            .map_err(missing)?;

        Ok(saved.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> CatalogResult<()> {
        match self.products.delete_by_id(id).await {
            Ok(()) => Ok(()),
            Err(StoreError::EntityNotFound { .. }) => Err(CatalogError::id_not_found(id)),
            Err(StoreError::IntegrityViolation(detail)) => {
                tracing::warn!(product_id = id, %detail, "Delete blocked by a referencing record");
                Err(CatalogError::DataBase("Integrity violation".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, CategoryDto, Product};
    use crate::repository::{MockCategoryRepository, MockProductRepository};
    use chrono::{TimeZone, Utc};
    use mockall::predicate::eq;
    use sea_orm::DbErr;

    const EXISTING_ID: i64 = 10;
    const NON_EXISTING_ID: i64 = 1000;
    const DEPENDENT_ID: i64 = 4;

    fn electronics() -> Category {
        Category {
            id: 2,
            name: "Electronics".to_string(),
        }
    }

    fn product(id: Option<i64>) -> Product {
        Product {
            id,
            name: "PC Gamer Y".to_string(),
            description: "Gaming desktop".to_string(),
            price: 1700.0,
            image_url: "https://img/10.png".to_string(),
            date: Utc.with_ymd_and_hms(2020, 7, 14, 10, 0, 0).unwrap(),
            categories: vec![electronics()],
        }
    }

    fn dto() -> ProductDto {
        ProductDto {
            id: None,
            name: "Phone".to_string(),
            description: "Good Phone".to_string(),
            price: 800.0,
            image_url: "https://img/img.png".to_string(),
            date: Utc.with_ymd_and_hms(2020, 10, 20, 3, 0, 0).unwrap(),
            categories: vec![CategoryDto {
                id: 2,
                name: String::new(),
            }],
        }
    }

    fn service(
        products: MockProductRepository,
        categories: MockCategoryRepository,
    ) -> ProductService<MockProductRepository, MockCategoryRepository> {
        ProductService::new(products, categories)
    }

    #[tokio::test]
    async fn test_find_by_id_returns_dto_when_id_exists() {
        let mut products = MockProductRepository::new();
        products
            .expect_find_by_id()
            .with(eq(EXISTING_ID))
            .returning(|id| Ok(Some(product(Some(id)))));

        let found = service(products, MockCategoryRepository::new())
            .find_by_id(EXISTING_ID)
            .await
            .unwrap();

        assert_eq!(found.id, Some(EXISTING_ID));
        assert_eq!(found.name, "PC Gamer Y");
        assert_eq!(found.description, "Gaming desktop");
        assert_eq!(found.categories[0].name, "Electronics");
    }

    #[tokio::test]
    async fn test_find_by_id_fails_when_id_does_not_exist() {
        let mut products = MockProductRepository::new();
        products
            .expect_find_by_id()
            .with(eq(NON_EXISTING_ID))
            .returning(|_| Ok(None));

        let result = service(products, MockCategoryRepository::new())
            .find_by_id(NON_EXISTING_ID)
            .await;

        assert!(matches!(result, Err(CatalogError::ResourceNotFound(msg)) if msg == "Id not found 1000"));
    }

    #[tokio::test]
    async fn test_find_all_paged_without_filters_returns_page() {
        let mut products = MockProductRepository::new();
        products
            .expect_search()
            .withf(|category, name, _| category.is_none() && name.is_empty())
            .times(1)
            .returning(|_, _, page| Ok(Page::new(vec![product(Some(1))], &page, 1)));

        let page = service(products, MockCategoryRepository::new())
            .find_all_paged(0, "", PageRequest::default())
            .await
            .unwrap();

        assert_eq!(page.total_elements, 1);
        assert_eq!(page.content[0].id, Some(1));
    }

    #[tokio::test]
    async fn test_find_all_paged_empty_result_is_a_page() {
        let mut products = MockProductRepository::new();
        products
            .expect_search()
            .returning(|_, _, page| Ok(Page::new(vec![], &page, 0)));

        let page = service(products, MockCategoryRepository::new())
            .find_all_paged(0, "", PageRequest::default())
            .await
            .unwrap();

        assert!(page.empty);
        assert!(page.content.is_empty());
    }

    #[tokio::test]
    async fn test_find_all_paged_passes_category_and_name() {
        let mut products = MockProductRepository::new();
        products
            .expect_search()
            .withf(|category, name, page| {
                *category == Some(3) && name.to_string() == "gamer" && page.size == 5
            })
            .times(1)
            .returning(|_, _, page| Ok(Page::new(vec![], &page, 0)));

        service(products, MockCategoryRepository::new())
            .find_all_paged(3, "  gamer ", PageRequest::new(0, 5).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_insert_resolves_categories_and_returns_generated_id() {
        let mut products = MockProductRepository::new();
        let mut categories = MockCategoryRepository::new();

        categories
            .expect_get_references()
            .with(eq(vec![2]))
            .times(1)
            .returning(|_| Ok(vec![electronics()]));
        products
            .expect_save()
            .withf(|p| p.id.is_none() && p.categories == vec![electronics()])
            .times(1)
            .returning(|mut p| {
                p.id = Some(26);
                Ok(p)
            });

        let created = service(products, categories).insert(dto()).await.unwrap();

        assert_eq!(created.id, Some(26));
        assert_eq!(created.name, "Phone");
        assert_eq!(created.categories[0].name, "Electronics");
    }

    #[tokio::test]
    async fn test_insert_with_unknown_category_propagates_store_error() {
        let mut products = MockProductRepository::new();
        let mut categories = MockCategoryRepository::new();

        categories.expect_get_references().returning(|_| {
            Err(StoreError::EntityNotFound {
                entity: "Category",
                id: 2,
            })
        });
        products.expect_save().times(0);

        let result = service(products, categories).insert(dto()).await;

        assert!(matches!(
            result,
            Err(CatalogError::Store(StoreError::EntityNotFound { entity: "Category", .. }))
        ));
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_dto() {
        let invalid = ProductDto {
            price: -1.0,
            ..dto()
        };

        let result = service(MockProductRepository::new(), MockCategoryRepository::new())
            .insert(invalid)
            .await;

        assert!(matches!(result, Err(CatalogError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_returns_dto_when_id_exists() {
        let mut products = MockProductRepository::new();
        let mut categories = MockCategoryRepository::new();

        products
            .expect_exists()
            .with(eq(EXISTING_ID))
            .returning(|_| Ok(true));
        categories
            .expect_get_references()
            .returning(|_| Ok(vec![electronics()]));
        products
            .expect_save()
            .withf(|p| p.id == Some(EXISTING_ID))
            .times(1)
            .returning(Ok);

        let input = dto();
        let updated = service(products, categories)
            .update(EXISTING_ID, input.clone())
            .await
            .unwrap();

        assert_eq!(updated.id, Some(EXISTING_ID));
        assert_eq!(updated.name, input.name);
        assert_eq!(updated.description, input.description);
        assert_eq!(updated.price, input.price);
        assert_eq!(updated.image_url, input.image_url);
        assert_eq!(updated.date, input.date);
    }

    #[tokio::test]
    async fn test_update_fails_when_id_does_not_exist() {
        let mut products = MockProductRepository::new();
        products
            .expect_exists()
            .with(eq(NON_EXISTING_ID))
            .returning(|_| Ok(false));
        products.expect_save().times(0);

        let result = service(products, MockCategoryRepository::new())
            .update(NON_EXISTING_ID, dto())
            .await;

        assert!(matches!(result, Err(CatalogError::ResourceNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_with_unknown_category_is_not_found() {
        let mut products = MockProductRepository::new();
        let mut categories = MockCategoryRepository::new();

        products.expect_exists().returning(|_| Ok(true));
        categories.expect_get_references().returning(|_| {
            Err(StoreError::EntityNotFound {
                entity: "Category",
                id: 2,
            })
        });
        products.expect_save().times(0);

        let result = service(products, categories).update(EXISTING_ID, dto()).await;

        assert!(matches!(result, Err(CatalogError::ResourceNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_when_row_vanishes_before_write_is_not_found() {
        let mut products = MockProductRepository::new();
        let mut categories = MockCategoryRepository::new();

        products.expect_exists().returning(|_| Ok(true));
        categories
            .expect_get_references()
            .returning(|_| Ok(vec![electronics()]));
        products.expect_save().returning(|p| {
            Err(StoreError::EntityNotFound {
                entity: "Product",
                id: p.id.unwrap_or_default(),
            })
        });

        let result = service(products, categories).update(EXISTING_ID, dto()).await;

        assert!(matches!(result, Err(CatalogError::ResourceNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_does_nothing_when_id_exists() {
        let mut products = MockProductRepository::new();
        products
            .expect_delete_by_id()
            .with(eq(EXISTING_ID))
            .times(1)
            .returning(|_| Ok(()));

        let result = service(products, MockCategoryRepository::new())
            .delete(EXISTING_ID)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_delete_fails_when_id_does_not_exist() {
        let mut products = MockProductRepository::new();
        products
            .expect_delete_by_id()
            .with(eq(NON_EXISTING_ID))
            .times(1)
            .returning(|id| {
                Err(StoreError::EntityNotFound {
                    entity: "Product",
                    id,
                })
            });

        let result = service(products, MockCategoryRepository::new())
            .delete(NON_EXISTING_ID)
            .await;

        assert!(matches!(result, Err(CatalogError::ResourceNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_fails_when_product_is_referenced() {
        let mut products = MockProductRepository::new();
        products
            .expect_delete_by_id()
            .with(eq(DEPENDENT_ID))
            .times(1)
            .returning(|_| Err(StoreError::IntegrityViolation("fk_order_lines_product".into())));

        let result = service(products, MockCategoryRepository::new())
            .delete(DEPENDENT_ID)
            .await;

        assert!(matches!(result, Err(CatalogError::DataBase(msg)) if msg == "Integrity violation"));
    }

    #[tokio::test]
    async fn test_delete_propagates_unclassified_failures() {
        let mut products = MockProductRepository::new();
        products
            .expect_delete_by_id()
            .returning(|_| Err(StoreError::Db(DbErr::Custom("connection reset".into()))));

        let result = service(products, MockCategoryRepository::new())
            .delete(EXISTING_ID)
            .await;

        assert!(matches!(result, Err(CatalogError::Store(StoreError::Db(_)))));
    }
}
