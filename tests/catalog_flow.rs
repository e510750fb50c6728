mod common;

use common::{NewProduct, create_user, insert_order, insert_pickup_point, insert_product};
use retail_orders::{
    dto::products::{FieldChoice, ProductForm},
    entity::products::Entity as Products,
    error::AppError,
    models::Role,
    routes::params::{ProductListQuery, StockOrdering},
    services::product_service,
};
use rust_decimal::Decimal;
use sea_orm::{EntityTrait, PaginatorTrait};

fn form(sku: &str, price: Decimal) -> ProductForm {
    ProductForm {
        sku: sku.into(),
        name: "Boots".into(),
        unit: "pcs".into(),
        price,
        supplier: "Acme".into(),
        manufacturer: String::new(),
        category: String::new(),
        discount: 0,
        stock: 3,
        description: String::new(),
    }
}

#[tokio::test]
async fn negative_price_is_rejected_without_mutation() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let admin = common::admin(&app.state).await?;

    let err = product_service::create_product(&app.state, &admin, form("A1", Decimal::new(-1, 2)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(Products::find().count(&app.state.orm).await?, 0);

    product_service::create_product(&app.state, &admin, form("A1", Decimal::ZERO)).await?;
    let err = product_service::update_product(&app.state, &admin, "A1", form("A1", Decimal::new(-5, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let stored = Products::find_by_id("A1").one(&app.state.orm).await?.unwrap();
    assert_eq!(stored.price_minor, 0);
    Ok(())
}

#[tokio::test]
async fn create_computes_discounted_price() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let admin = common::admin(&app.state).await?;

    let mut payload = form("A1", Decimal::new(100, 0));
    payload.discount = 10;
    let created = product_service::create_product(&app.state, &admin, payload)
        .await?
        .data
        .unwrap();
    assert_eq!(created.discounted_price, Decimal::new(90, 0));

    let err = product_service::create_product(&app.state, &admin, form("A1", Decimal::ONE))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "duplicate SKU");
    Ok(())
}

#[tokio::test]
async fn update_never_changes_sku() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let admin = common::admin(&app.state).await?;
    insert_product(&app.state, NewProduct::default()).await?;

    let mut payload = form("B2", Decimal::new(250, 0));
    payload.name = "Renamed".into();
    let updated = product_service::update_product(&app.state, &admin, "A1", payload)
        .await?
        .data
        .unwrap();

    assert_eq!(updated.sku, "A1");
    assert_eq!(updated.name, "Renamed");
    assert!(Products::find_by_id("B2").one(&app.state.orm).await?.is_none());
    assert_eq!(Products::find().count(&app.state.orm).await?, 1);
    Ok(())
}

#[tokio::test]
async fn non_admin_roles_are_denied() -> anyhow::Result<()> {
    let app = common::setup().await?;
    insert_product(&app.state, NewProduct::default()).await?;

    for (login, role) in [
        ("guest", Role::Guest),
        ("client", Role::Client),
        ("manager", Role::Manager),
    ] {
        let user = create_user(&app.state, login, role, ("", "", "")).await?;

        let err = product_service::create_product(&app.state, &user, form("Z9", Decimal::ONE))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let err = product_service::update_product(&app.state, &user, "A1", form("A1", Decimal::ONE))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let err = product_service::delete_product(&app.state, &user, "A1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    let products = Products::find().all(&app.state.orm).await?;
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Product");
    assert_eq!(products[0].price_minor, 10_000);
    Ok(())
}

#[tokio::test]
async fn delete_removes_photo_file() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let admin = common::admin(&app.state).await?;
    let photo = common::stored_photo(&app.state).await?;
    insert_product(
        &app.state,
        NewProduct {
            photo: Some(photo.as_str()),
            ..Default::default()
        },
    )
    .await?;
    assert!(common::photo_exists(&app.state, &photo));

    product_service::delete_product(&app.state, &admin, "A1").await?;

    assert!(Products::find_by_id("A1").one(&app.state.orm).await?.is_none());
    assert!(!common::photo_exists(&app.state, &photo));
    Ok(())
}

#[tokio::test]
async fn delete_succeeds_when_photo_file_is_already_gone() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let admin = common::admin(&app.state).await?;
    insert_product(
        &app.state,
        NewProduct {
            photo: Some("products/missing.png"),
            ..Default::default()
        },
    )
    .await?;

    product_service::delete_product(&app.state, &admin, "A1").await?;
    assert_eq!(Products::find().count(&app.state.orm).await?, 0);
    Ok(())
}

#[tokio::test]
async fn referenced_product_cannot_be_deleted() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let admin = common::admin(&app.state).await?;
    let photo = common::stored_photo(&app.state).await?;
    insert_product(
        &app.state,
        NewProduct {
            photo: Some(photo.as_str()),
            ..Default::default()
        },
    )
    .await?;
    let pickup = insert_pickup_point(&app.state, "Lesnaya 1").await?;
    insert_order(&app.state, 1, pickup, None, &[("A1", 2)]).await?;

    let err = product_service::delete_product(&app.state, &admin, "A1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ReferencedByOrder));
    assert!(Products::find_by_id("A1").one(&app.state.orm).await?.is_some());
    assert!(common::photo_exists(&app.state, &photo), "photo kept");
    Ok(())
}

#[tokio::test]
async fn replacing_photo_removes_previous_file() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let admin = common::admin(&app.state).await?;
    insert_product(&app.state, NewProduct::default()).await?;

    let first = product_service::set_photo(&app.state, &admin, "A1", Some("a.png".into()), b"one".to_vec())
        .await?
        .data
        .unwrap()
        .photo
        .unwrap();
    assert!(first.starts_with("products/") && first.ends_with(".png"));
    assert!(common::photo_exists(&app.state, &first));

    let second = product_service::set_photo(&app.state, &admin, "A1", Some("b.jpg".into()), b"two".to_vec())
        .await?
        .data
        .unwrap()
        .photo
        .unwrap();
    assert_ne!(first, second);
    assert!(!common::photo_exists(&app.state, &first));
    assert!(common::photo_exists(&app.state, &second));

    let cleared = product_service::clear_photo(&app.state, &admin, "A1")
        .await?
        .data
        .unwrap();
    assert_eq!(cleared.photo, None);
    assert!(!common::photo_exists(&app.state, &second));
    Ok(())
}

#[tokio::test]
async fn category_and_manufacturer_come_from_existing_values() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let admin = common::admin(&app.state).await?;

    let choices = product_service::form_choices(&app.state, &admin)
        .await?
        .data
        .unwrap();
    assert_eq!(choices.category, FieldChoice::FreeText);

    insert_product(
        &app.state,
        NewProduct {
            category: "Shoes",
            manufacturer: "Kari",
            ..Default::default()
        },
    )
    .await?;
    let choices = product_service::form_choices(&app.state, &admin)
        .await?
        .data
        .unwrap();
    assert_eq!(
        choices.category,
        FieldChoice::Choice {
            options: vec![String::new(), "Shoes".into()]
        }
    );

    let mut payload = form("B2", Decimal::ONE);
    payload.category = "Hats".into();
    let err = product_service::create_product(&app.state, &admin, payload)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut payload = form("B2", Decimal::ONE);
    payload.category = "Shoes".into();
    payload.manufacturer = "Kari".into();
    product_service::create_product(&app.state, &admin, payload).await?;
    Ok(())
}

#[tokio::test]
async fn listing_filters_and_orders_by_stock() -> anyhow::Result<()> {
    let app = common::setup().await?;
    for (sku, name, supplier, category, stock) in [
        ("A1", "Winter Boots", "Acme", "Shoes", 5),
        ("B2", "Sandals", "Acme", "Summer", 1),
        ("C3", "Scarf", "Other", "Accessories", 9),
    ] {
        insert_product(
            &app.state,
            NewProduct {
                sku,
                name,
                supplier,
                category,
                stock,
                ..Default::default()
            },
        )
        .await?;
    }

    let skus = |query: ProductListQuery| {
        let state = app.state.clone();
        async move {
            let list = product_service::list_products(&state, query)
                .await?
                .data
                .unwrap();
            anyhow::Ok(list.items.into_iter().map(|p| p.sku).collect::<Vec<_>>())
        }
    };

    assert_eq!(skus(ProductListQuery::default()).await?, vec!["A1", "B2", "C3"]);
    assert_eq!(
        skus(ProductListQuery {
            search: Some("boots".into()),
            ..Default::default()
        })
        .await?,
        vec!["A1"]
    );
    assert_eq!(
        skus(ProductListQuery {
            search: Some("SUMMER".into()),
            ..Default::default()
        })
        .await?,
        vec!["B2"]
    );
    assert_eq!(
        skus(ProductListQuery {
            supplier: Some("Acme".into()),
            ordering: Some(StockOrdering::Asc),
            ..Default::default()
        })
        .await?,
        vec!["B2", "A1"]
    );
    assert_eq!(
        skus(ProductListQuery {
            ordering: Some(StockOrdering::Desc),
            ..Default::default()
        })
        .await?,
        vec!["C3", "A1", "B2"]
    );
    assert!(
        skus(ProductListQuery {
            search: Some("%".into()),
            ..Default::default()
        })
        .await?
        .is_empty()
    );
    Ok(())
}
