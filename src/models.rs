use chrono::NaiveDate;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use crate::entity::users::Role;

/// Number of decimal places of stored prices.
pub const PRICE_SCALE: u32 = 2;

pub fn price_from_minor(minor: i64) -> Decimal {
    Decimal::new(minor, PRICE_SCALE)
}

/// Converts a price to minor units, rounding to the stored scale.
/// Returns `None` when the value does not fit.
pub fn price_to_minor(price: Decimal) -> Option<i64> {
    (price.round_dp(PRICE_SCALE) * Decimal::ONE_HUNDRED).to_i64()
}

/// Price after applying a percent discount. A discount of zero or less leaves the price as is.
pub fn discounted_price(price: Decimal, discount: i32) -> Decimal {
    if discount > 0 {
        price * (Decimal::ONE - Decimal::from(discount) / Decimal::ONE_HUNDRED)
    } else {
        price
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i32,
    pub login: String,
    pub role: Role,
    pub display_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PickupPoint {
    pub id: i32,
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub sku: String,
    pub name: String,
    pub unit: String,
    pub price: Decimal,
    pub discounted_price: Decimal,
    pub supplier: String,
    pub manufacturer: String,
    pub category: String,
    pub discount: i32,
    pub stock: i32,
    pub description: String,
    pub photo: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub order_id: i32,
    pub order_date: NaiveDate,
    pub delivery_date: NaiveDate,
    pub pickup_point_id: i32,
    pub client_id: Option<i32>,
    pub code: i32,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub product_sku: String,
    pub quantity: i32,
}
