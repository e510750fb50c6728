#![allow(dead_code)]

use std::sync::Arc;

use calamine::Data;
use retail_orders::{
    assets::PhotoStorage,
    db::{create_orm_conn, run_migrations},
    entity::{
        order_items::ActiveModel as OrderItemActive,
        orders::ActiveModel as OrderActive,
        pickup_points::ActiveModel as PickupPointActive,
        products::ActiveModel as ProductActive,
        users::ActiveModel as UserActive,
    },
    importer::{Sheet, Workbook},
    middleware::auth::AuthUser,
    models::Role,
    state::AppState,
};
use sea_orm::{ActiveModelTrait, Set};
use tempfile::TempDir;

pub const JWT_SECRET: &str = "test-secret";

/// Service state over a fresh in-memory database. The media directory lives as long as
/// the returned guard.
pub struct TestApp {
    pub state: AppState,
    pub media: TempDir,
}

pub async fn setup() -> anyhow::Result<TestApp> {
    let orm = create_orm_conn("sqlite::memory:").await?;
    run_migrations(&orm).await?;
    let media = tempfile::tempdir()?;
    let state = AppState {
        orm,
        photos: PhotoStorage::new(media.path()),
        jwt_secret: Arc::from(JWT_SECRET),
    };
    Ok(TestApp { state, media })
}

pub async fn create_user(
    state: &AppState,
    login: &str,
    role: Role,
    full_name: (&str, &str, &str),
) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        login: Set(login.to_string()),
        password_hash: Set("!".into()),
        role: Set(role),
        last_name: Set(full_name.0.to_string()),
        first_name: Set(full_name.1.to_string()),
        patronymic: Set(full_name.2.to_string()),
        is_staff: Set(role.is_staff()),
        is_superuser: Set(false),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser {
        user_id: user.id,
        role,
    })
}

pub async fn admin(state: &AppState) -> anyhow::Result<AuthUser> {
    create_user(state, "admin", Role::Admin, ("", "", "")).await
}

pub async fn create_superuser(state: &AppState, login: &str) -> anyhow::Result<i32> {
    let user = UserActive {
        login: Set(login.to_string()),
        password_hash: Set("!".into()),
        role: Set(Role::Admin),
        last_name: Set(String::new()),
        first_name: Set(String::new()),
        patronymic: Set(String::new()),
        is_staff: Set(true),
        is_superuser: Set(true),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;
    Ok(user.id)
}

pub struct NewProduct<'a> {
    pub sku: &'a str,
    pub name: &'a str,
    pub supplier: &'a str,
    pub manufacturer: &'a str,
    pub category: &'a str,
    pub description: &'a str,
    pub price_minor: i64,
    pub discount: i32,
    pub stock: i32,
    pub photo: Option<&'a str>,
}

impl Default for NewProduct<'_> {
    fn default() -> Self {
        Self {
            sku: "A1",
            name: "Product",
            supplier: "",
            manufacturer: "",
            category: "",
            description: "",
            price_minor: 10_000,
            discount: 0,
            stock: 1,
            photo: None,
        }
    }
}

pub async fn insert_product(state: &AppState, product: NewProduct<'_>) -> anyhow::Result<()> {
    ProductActive {
        sku: Set(product.sku.to_string()),
        name: Set(product.name.to_string()),
        unit: Set("pcs".into()),
        price_minor: Set(product.price_minor),
        supplier: Set(product.supplier.to_string()),
        manufacturer: Set(product.manufacturer.to_string()),
        category: Set(product.category.to_string()),
        discount: Set(product.discount),
        stock: Set(product.stock),
        description: Set(product.description.to_string()),
        photo: Set(product.photo.map(str::to_string)),
    }
    .insert(&state.orm)
    .await?;
    Ok(())
}

pub async fn insert_pickup_point(state: &AppState, address: &str) -> anyhow::Result<i32> {
    let point = PickupPointActive {
        address: Set(address.to_string()),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;
    Ok(point.id)
}

pub async fn insert_order(
    state: &AppState,
    order_id: i32,
    pickup_point_id: i32,
    client_id: Option<i32>,
    items: &[(&str, i32)],
) -> anyhow::Result<()> {
    let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).ok_or_else(|| anyhow::anyhow!("date"))?;
    OrderActive {
        order_id: Set(order_id),
        order_date: Set(date),
        delivery_date: Set(date),
        pickup_point_id: Set(pickup_point_id),
        client_id: Set(client_id),
        code: Set(100 + order_id),
        status: Set("Новый".into()),
    }
    .insert(&state.orm)
    .await?;
    for (sku, quantity) in items {
        OrderItemActive {
            order_id: Set(order_id),
            product_sku: Set(sku.to_string()),
            quantity: Set(*quantity),
            ..Default::default()
        }
        .insert(&state.orm)
        .await?;
    }
    Ok(())
}

/// Writes a small file under the media root and returns its reference.
pub async fn stored_photo(state: &AppState) -> anyhow::Result<String> {
    Ok(state.photos.store(Some("photo.jpg"), b"jpeg").await?)
}

pub fn photo_exists(state: &AppState, reference: &str) -> bool {
    state
        .photos
        .path_of(reference)
        .is_some_and(|path| path.exists())
}

pub fn text(value: &str) -> Data {
    Data::String(value.to_string())
}

pub fn order_row(order_id: i64, items: &str, pickup: i64, client: &str) -> Vec<Data> {
    vec![
        Data::Float(order_id as f64),
        text(items),
        text("2024-02-27"),
        text("2024-03-02"),
        Data::Float(pickup as f64),
        text(client),
        Data::Float(901.0),
        text("Новый"),
    ]
}

/// Product row: sku, name, unit, price, supplier, manufacturer, category, discount,
/// stock, description.
pub fn product_row(sku: &str, price: f64, discount: f64) -> Vec<Data> {
    vec![
        text(sku),
        text("Boots"),
        text("pcs"),
        Data::Float(price),
        text("Acme"),
        text("Kari"),
        text("Shoes"),
        Data::Float(discount),
        Data::Float(4.0),
        text("Winter boots"),
    ]
}

/// One pickup point, one admin, one product `A1` (price 100, discount 10) and one order
/// of three `A1`.
pub fn scenario_workbook() -> Workbook {
    Workbook {
        pickup_points: Sheet::from_rows(vec![vec![text("420151, Lesnaya 1")]]),
        users: Sheet::from_rows(vec![vec![
            text("Администратор"),
            text("Nikiforova Vesenia Nikolaevna"),
            text("nikiforova"),
            text("secret"),
        ]]),
        products: Sheet::from_rows(vec![product_row("A1", 100.0, 10.0)]),
        orders: Sheet::from_rows(vec![order_row(
            1,
            "A1, 3",
            1,
            "Nikiforova Vesenia Nikolaevna",
        )]),
    }
}
