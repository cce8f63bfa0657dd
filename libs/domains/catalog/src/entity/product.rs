use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::entity::prelude::*;

use crate::models::{Category, Product};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Double")]
    pub price: f64,
    pub image_url: String,
    pub date: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Attach the product's categories, already in position order.
    pub fn into_product(self, categories: Vec<Category>) -> Product {
        Product {
            id: Some(self.id),
            name: self.name,
            description: self.description,
            price: self.price,
            image_url: self.image_url,
            date: self.date.into(),
            categories,
        }
    }
}

// A transient product inserts; a product with an id overwrites that row.
impl From<&Product> for ActiveModel {
    fn from(product: &Product) -> Self {
        ActiveModel {
            id: match product.id {
                Some(id) => Unchanged(id),
                None => NotSet,
            },
            name: Set(product.name.clone()),
            description: Set(product.description.clone()),
            price: Set(product.price),
            image_url: Set(product.image_url.clone()),
            date: Set(product.date.into()),
        }
    }
}
