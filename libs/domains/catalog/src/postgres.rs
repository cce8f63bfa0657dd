use async_trait::async_trait;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Expr, Order, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::{
    entity::{category, product, product_category},
    error::{StoreError, StoreResult},
    models::{Category, Product},
    page::{Direction, Page, PageRequest, SortField},
    repository::{CategoryRepository, ProductRepository},
};

/// Escape `%`, `_` and the escape character itself for a LIKE pattern.
fn like_fragment(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("%{}%", escaped)
}

/// Categories of each product, in attachment order.
async fn load_categories<C: ConnectionTrait>(
    conn: &C,
    product_ids: &[i64],
) -> Result<HashMap<i64, Vec<Category>>, DbErr> {
    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let links = product_category::Entity::find()
        .filter(product_category::Column::ProductId.is_in(product_ids.iter().copied()))
        .order_by_asc(product_category::Column::ProductId)
        .order_by_asc(product_category::Column::Position)
        .all(conn)
        .await?;

    let category_ids: BTreeSet<i64> = links.iter().map(|link| link.category_id).collect();
    let categories: HashMap<i64, category::Model> = category::Entity::find()
        .filter(category::Column::Id.is_in(category_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|model| (model.id, model))
        .collect();

    let mut grouped: HashMap<i64, Vec<Category>> = HashMap::new();
    for link in links {
        if let Some(model) = categories.get(&link.category_id) {
            grouped
                .entry(link.product_id)
                .or_default()
                .push(model.clone().into());
        }
    }
    Ok(grouped)
}

pub struct PgProductRepository {
    db: DatabaseConnection,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Product>> {
        let Some(model) = product::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut categories = load_categories(&self.db, &[id]).await?;
        Ok(Some(model.into_product(categories.remove(&id).unwrap_or_default())))
    }

    async fn exists(&self, id: i64) -> StoreResult<bool> {
        let count = product::Entity::find_by_id(id).count(&self.db).await?;
        Ok(count > 0)
    }

    async fn save(&self, product: Product) -> StoreResult<Product> {
        let mut seen = HashSet::new();
        let categories: Vec<Category> = product
            .categories
            .iter()
            .filter(|category| seen.insert(category.id))
            .cloned()
            .collect();

        let txn = self.db.begin().await?;

        let active = product::ActiveModel::from(&product);
        let model = match product.id {
            None => active.insert(&txn).await?,
            Some(id) => match active.update(&txn).await {
                Ok(model) => model,
                Err(DbErr::RecordNotUpdated) => {
                    return Err(StoreError::EntityNotFound {
                        entity: "Product",
                        id,
                    });
                }
                Err(e) => return Err(e.into()),
            },
        };

        product_category::Entity::delete_many()
            .filter(product_category::Column::ProductId.eq(model.id))
            .exec(&txn)
            .await?;

        if !categories.is_empty() {
            let links = categories
                .iter()
                .enumerate()
                .map(|(position, category)| {
                    let position = i32::try_from(position).map_err(|_| {
                        DbErr::Custom(format!("category position {} out of range", position))
                    })?;
                    Ok(product_category::ActiveModel {
                        product_id: Set(model.id),
                        category_id: Set(category.id),
                        position: Set(position),
                    })
                })
                .collect::<Result<Vec<_>, DbErr>>()?;
            product_category::Entity::insert_many(links)
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;

        tracing::info!(product_id = model.id, "Saved product");
        Ok(model.into_product(categories))
    }

    async fn delete_by_id(&self, id: i64) -> StoreResult<()> {
        let txn = self.db.begin().await?;

        product_category::Entity::delete_many()
            .filter(product_category::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;

        let result = product::Entity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(StoreError::EntityNotFound {
                entity: "Product",
                id,
            });
        }

        txn.commit().await?;

        tracing::info!(product_id = id, "Deleted product");
        Ok(())
    }

    async fn search(
        &self,
        category_id: Option<i64>,
        name: &str,
        page: PageRequest,
    ) -> StoreResult<Page<Product>> {
        let mut query = product::Entity::find();

        if let Some(category_id) = category_id {
            query = query.filter(
                product::Column::Id.in_subquery(
                    Query::select()
                        .column(product_category::Column::ProductId)
                        .from(product_category::Entity)
                        .and_where(product_category::Column::CategoryId.eq(category_id))
                        .to_owned(),
                ),
            );
        }

        let name = name.trim();
        if !name.is_empty() {
            query = query.filter(Expr::cust_with_values(
                r#"LOWER("products"."name") LIKE ?"#,
                [like_fragment(&name.to_lowercase())],
            ));
        }

        let column = match page.sort.field {
            SortField::Id => product::Column::Id,
            SortField::Name => product::Column::Name,
            SortField::Price => product::Column::Price,
            SortField::Date => product::Column::Date,
        };
        let order = match page.sort.direction {
            Direction::Asc => Order::Asc,
            Direction::Desc => Order::Desc,
        };
        query = query.order_by(column, order);
        if page.sort.field != SortField::Id {
            // Stable pages when the sort key has ties.
            query = query.order_by_asc(product::Column::Id);
        }

        let paginator = query.paginate(&self.db, page.size);
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.page).await?;

        let ids: Vec<i64> = models.iter().map(|model| model.id).collect();
        let mut categories = load_categories(&self.db, &ids).await?;

        let content = models
            .into_iter()
            .map(|model| {
                let attached = categories.remove(&model.id).unwrap_or_default();
                model.into_product(attached)
            })
            .collect();

        Ok(Page::new(content, &page, total))
    }
}

pub struct PgCategoryRepository {
    db: DatabaseConnection,
}

impl PgCategoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn get_references(&self, ids: Vec<i64>) -> StoreResult<Vec<Category>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found: HashMap<i64, category::Model> = category::Entity::find()
            .filter(category::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|model| (model.id, model))
            .collect();

        ids.into_iter()
            .map(|id| {
                found
                    .get(&id)
                    .cloned()
                    .map(Category::from)
                    .ok_or(StoreError::EntityNotFound {
                        entity: "Category",
                        id,
                    })
            })
            .collect()
    }
}
