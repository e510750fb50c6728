use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use crate::models::{discounted_price, price_from_minor};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub sku: String,
    pub name: String,
    pub unit: String,
    /// Price in minor currency units (two decimal places).
    pub price_minor: i64,
    pub supplier: String,
    pub manufacturer: String,
    pub category: String,
    pub discount: i32,
    pub stock: i32,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// Path of the photo file relative to the media root.
    pub photo: Option<String>,
}

impl Model {
    pub fn price(&self) -> Decimal {
        price_from_minor(self.price_minor)
    }

    pub fn discounted_price(&self) -> Decimal {
        discounted_price(self.price(), self.discount)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
