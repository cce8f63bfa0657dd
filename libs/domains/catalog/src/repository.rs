use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::models::{Category, Product};
use crate::page::{Direction, Page, PageRequest, SortField};

/// Repository trait for Product persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Load a product with its categories
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Product>>;

    async fn exists(&self, id: i64) -> StoreResult<bool>;

    /// Insert when `product.id` is `None`, otherwise overwrite that row and
    /// replace its category set. Overwriting a missing row is `EntityNotFound`.
    async fn save(&self, product: Product) -> StoreResult<Product>;

    /// `EntityNotFound` when absent, `IntegrityViolation` when another
    /// record still references the product.
    async fn delete_by_id(&self, id: i64) -> StoreResult<()>;

    /// Filter by category and case-insensitive name fragment, then sort and page.
    async fn search(
        &self,
        category_id: Option<i64>,
        name: &str,
        page: PageRequest,
    ) -> StoreResult<Page<Product>>;
}

/// Repository trait for Category lookups
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Resolve ids in the given order; the first unknown id is `EntityNotFound`.
    async fn get_references(&self, ids: Vec<i64>) -> StoreResult<Vec<Category>>;
}

fn compare(a: &Product, b: &Product, field: SortField) -> Ordering {
    let ordering = match field {
        SortField::Id => Ordering::Equal,
        SortField::Name => a.name.cmp(&b.name),
        SortField::Price => a.price.total_cmp(&b.price),
        SortField::Date => a.date.cmp(&b.date),
    };
    ordering.then_with(|| a.id.cmp(&b.id))
}

fn dedup_categories(categories: Vec<Category>) -> Vec<Category> {
    let mut seen = HashSet::new();
    categories
        .into_iter()
        .filter(|category| seen.insert(category.id))
        .collect()
}

/// In-memory implementation of ProductRepository (for development/testing)
#[derive(Debug, Clone)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<HashMap<i64, Product>>>,
    referenced: Arc<RwLock<HashSet<i64>>>,
    sequence: Arc<AtomicI64>,
}

impl Default for InMemoryProductRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self {
            products: Arc::new(RwLock::new(HashMap::new())),
            referenced: Arc::new(RwLock::new(HashSet::new())),
            sequence: Arc::new(AtomicI64::new(1)),
        }
    }

    /// Mark a product as referenced by another record, so deleting it fails.
    pub async fn protect(&self, id: i64) {
        self.referenced.write().await.insert(id);
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.get(&id).cloned())
    }

    async fn exists(&self, id: i64) -> StoreResult<bool> {
        let products = self.products.read().await;
        Ok(products.contains_key(&id))
    }

    async fn save(&self, mut product: Product) -> StoreResult<Product> {
        let mut products = self.products.write().await;

        let id = match product.id {
            Some(id) if !products.contains_key(&id) => {
                return Err(StoreError::EntityNotFound {
                    entity: "Product",
                    id,
                });
            }
            Some(id) => id,
            None => self.sequence.fetch_add(1, AtomicOrdering::SeqCst),
        };

        product.id = Some(id);
        product.categories = dedup_categories(product.categories);
        products.insert(id, product.clone());

        tracing::debug!(product_id = id, "Saved product");
        Ok(product)
    }

    async fn delete_by_id(&self, id: i64) -> StoreResult<()> {
        let mut products = self.products.write().await;

        if !products.contains_key(&id) {
            return Err(StoreError::EntityNotFound {
                entity: "Product",
                id,
            });
        }
        if self.referenced.read().await.contains(&id) {
            return Err(StoreError::IntegrityViolation(format!(
                "product {} is referenced by an order line",
                id
            )));
        }

        products.remove(&id);
        Ok(())
    }

    async fn search(
        &self,
        category_id: Option<i64>,
        name: &str,
        page: PageRequest,
    ) -> StoreResult<Page<Product>> {
        let products = self.products.read().await;
        let needle = name.trim().to_lowercase();

        let mut matching: Vec<Product> = products
            .values()
            .filter(|p| {
                category_id.is_none_or(|cid| p.categories.iter().any(|c| c.id == cid))
            })
            .filter(|p| needle.is_empty() || p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let ordering = compare(a, b, page.sort.field);
            match page.sort.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            }
        });

        let total = u64::try_from(matching.len()).unwrap_or(u64::MAX);
        let content = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.size).unwrap_or(usize::MAX))
            .collect();

        Ok(Page::new(content, &page, total))
    }
}

/// In-memory implementation of CategoryRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryCategoryRepository {
    categories: Arc<RwLock<HashMap<i64, Category>>>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        let map = categories.into_iter().map(|c| (c.id, c)).collect();
        Self {
            categories: Arc::new(RwLock::new(map)),
        }
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn get_references(&self, ids: Vec<i64>) -> StoreResult<Vec<Category>> {
        let categories = self.categories.read().await;
        ids.into_iter()
            .map(|id| {
                categories
                    .get(&id)
                    .cloned()
                    .ok_or(StoreError::EntityNotFound {
                        entity: "Category",
                        id,
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Sort;
    use chrono::{TimeZone, Utc};

    fn category(id: i64, name: &str) -> Category {
        Category {
            id,
            name: name.to_string(),
        }
    }

    fn product(name: &str, price: f64, categories: Vec<Category>) -> Product {
        Product {
            id: None,
            name: name.to_string(),
            description: format!("{name} description"),
            price,
            image_url: String::new(),
            date: Utc.with_ymd_and_hms(2020, 7, 13, 20, 50, 7).unwrap(),
            categories,
        }
    }

    async fn seeded() -> InMemoryProductRepository {
        let repo = InMemoryProductRepository::new();
        let books = category(1, "Books");
        let electronics = category(2, "Electronics");
        let computers = category(3, "Computers");

        repo.save(product("The Lord of the Rings", 90.5, vec![books.clone()]))
            .await
            .unwrap();
        repo.save(product("Smart TV", 2190.0, vec![electronics.clone()]))
            .await
            .unwrap();
        repo.save(product("Macbook Pro", 1250.0, vec![computers.clone(), electronics]))
            .await
            .unwrap();
        repo.save(product("PC Gamer", 1200.0, vec![computers])).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_save_assigns_sequential_ids() {
        let repo = seeded().await;
        assert!(repo.exists(1).await.unwrap());
        assert!(repo.exists(4).await.unwrap());
        assert!(!repo.exists(5).await.unwrap());
    }

    #[tokio::test]
    async fn test_save_overwrites_existing() {
        let repo = seeded().await;
        let mut updated = product("Smart TV 4K", 2500.0, vec![]);
        updated.id = Some(2);

        let saved = repo.save(updated).await.unwrap();
        assert_eq!(saved.id, Some(2));

        let found = repo.find_by_id(2).await.unwrap().unwrap();
        assert_eq!(found.name, "Smart TV 4K");
        assert!(found.categories.is_empty());
    }

    #[tokio::test]
    async fn test_save_missing_id_is_not_found() {
        let repo = seeded().await;
        let mut ghost = product("Ghost", 1.0, vec![]);
        ghost.id = Some(1000);

        let result = repo.save(ghost).await;
        assert!(matches!(
            result,
            Err(StoreError::EntityNotFound { entity: "Product", id: 1000 })
        ));
    }

    #[tokio::test]
    async fn test_save_collapses_duplicate_categories() {
        let repo = InMemoryProductRepository::new();
        let saved = repo
            .save(product(
                "Kindle",
                400.0,
                vec![category(2, "Electronics"), category(1, "Books"), category(2, "Electronics")],
            ))
            .await
            .unwrap();

        let ids: Vec<i64> = saved.categories.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_delete_outcomes() {
        let repo = seeded().await;
        repo.protect(4).await;

        assert!(repo.delete_by_id(1).await.is_ok());
        assert!(!repo.exists(1).await.unwrap());

        assert!(matches!(
            repo.delete_by_id(1000).await,
            Err(StoreError::EntityNotFound { .. })
        ));
        assert!(matches!(
            repo.delete_by_id(4).await,
            Err(StoreError::IntegrityViolation(_))
        ));
        assert!(repo.exists(4).await.unwrap());
    }

    #[tokio::test]
    async fn test_search_by_category() {
        let repo = seeded().await;
        let page = repo
            .search(Some(3), "", PageRequest::default())
            .await
            .unwrap();

        let names: Vec<&str> = page.content.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Macbook Pro", "PC Gamer"]);
        assert_eq!(page.total_elements, 2);
    }

    #[tokio::test]
    async fn test_search_by_name_is_case_insensitive() {
        let repo = seeded().await;
        let page = repo.search(None, "pc ga", PageRequest::default()).await.unwrap();
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.content[0].name, "PC Gamer");
    }

    #[tokio::test]
    async fn test_search_sorts_and_pages() {
        let repo = seeded().await;
        let request = PageRequest::new(0, 2)
            .unwrap()
            .with_sort(Sort::new(SortField::Price, Direction::Desc));

        let page = repo.search(None, "", request).await.unwrap();
        let prices: Vec<f64> = page.content.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![2190.0, 1250.0]);
        assert_eq!(page.total_pages, 2);
        assert!(!page.last);
    }

    #[tokio::test]
    async fn test_search_far_past_the_end_is_empty_last_page() {
        let repo = seeded().await;
        let request = PageRequest::new(i64::MAX as u64 / 100, 100).unwrap();

        let page = repo.search(None, "", request).await.unwrap();
        assert!(page.empty);
        assert!(page.last);
        assert_eq!(page.total_elements, 4);
    }

    #[tokio::test]
    async fn test_search_empty_result_is_empty_page() {
        let repo = InMemoryProductRepository::new();
        let page = repo.search(None, "", PageRequest::default()).await.unwrap();
        assert!(page.empty);
        assert_eq!(page.total_elements, 0);
    }

    #[tokio::test]
    async fn test_get_references_keeps_order() {
        let repo = InMemoryCategoryRepository::with_categories([
            category(1, "Books"),
            category(2, "Electronics"),
            category(3, "Computers"),
        ]);

        let found = repo.get_references(vec![3, 1]).await.unwrap();
        assert_eq!(found, vec![category(3, "Computers"), category(1, "Books")]);
    }

    #[tokio::test]
    async fn test_get_references_fails_on_first_unknown() {
        let repo = InMemoryCategoryRepository::with_categories([category(1, "Books")]);

        let result = repo.get_references(vec![1, 7, 8]).await;
        assert!(matches!(
            result,
            Err(StoreError::EntityNotFound { entity: "Category", id: 7 })
        ));
    }
}
