//! The destructive replace: one transaction, children wiped before parents, parents
//! loaded before children.

use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use super::{ImportError, ImportSummary, dataset::ImportDataset};
use crate::{
    assets::StaleAssets,
    entity::{
        order_items::{ActiveModel as OrderItemActive, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Entity as Orders},
        pickup_points::{ActiveModel as PickupPointActive, Entity as PickupPoints},
        products::{ActiveModel as ProductActive, Column as ProductCol, Entity as Products},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
};

/// Replaces all non-superuser data with the dataset. Returns the photo files of the
/// replaced products, to be released once the caller knows the commit happened.
pub(crate) async fn replace_all(
    conn: &DatabaseConnection,
    dataset: ImportDataset,
) -> Result<(ImportSummary, StaleAssets), ImportError> {
    let txn = conn.begin().await?;

    let mut stale = StaleAssets::none();
    for product in Products::find()
        .filter(ProductCol::Photo.is_not_null())
        .all(&txn)
        .await?
    {
        stale.extend(StaleAssets::on_delete(product.photo));
    }

    tracing::info!("clearing existing data");
    OrderItems::delete_many().exec(&txn).await?;
    Orders::delete_many().exec(&txn).await?;
    Products::delete_many().exec(&txn).await?;
    Users::delete_many()
        .filter(UserCol::IsSuperuser.eq(false))
        .exec(&txn)
        .await?;
    PickupPoints::delete_many().exec(&txn).await?;

    let mut summary = ImportSummary {
        skipped_items: dataset.skipped_items,
        ambiguous_clients: dataset.ambiguous_clients,
        ..Default::default()
    };

    tracing::info!(count = dataset.pickup_points.len(), "importing pickup points");
    let mut pickup_ids: HashMap<usize, i32> = HashMap::new();
    for record in dataset.pickup_points {
        let created = PickupPointActive {
            address: Set(record.address),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        pickup_ids.insert(record.position, created.id);
    }
    summary.pickup_points = pickup_ids.len();

    tracing::info!(count = dataset.users.len(), "importing users");
    let mut user_ids: Vec<i32> = Vec::with_capacity(dataset.users.len());
    for record in dataset.users {
        let created = UserActive {
            login: Set(record.login),
            password_hash: Set(record.password_hash),
            role: Set(record.role),
            last_name: Set(record.last_name),
            first_name: Set(record.first_name),
            patronymic: Set(record.patronymic),
            is_staff: Set(record.is_staff),
            is_superuser: Set(false),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        user_ids.push(created.id);
    }
    summary.users = user_ids.len();

    tracing::info!(count = dataset.products.len(), "importing products");
    for record in dataset.products {
        ProductActive {
            sku: Set(record.sku),
            name: Set(record.name),
            unit: Set(record.unit),
            price_minor: Set(record.price_minor),
            supplier: Set(record.supplier),
            manufacturer: Set(record.manufacturer),
            category: Set(record.category),
            discount: Set(record.discount),
            stock: Set(record.stock),
            description: Set(record.description),
            photo: Set(None),
        }
        .insert(&txn)
        .await?;
        summary.products += 1;
    }

    tracing::info!(count = dataset.orders.len(), "importing orders");
    for record in dataset.orders {
        // Positions were checked against the pickup sheet while parsing.
        let pickup_point_id = pickup_ids[&record.pickup_position];
        let client_id = record.client.and_then(|index| user_ids.get(index).copied());

        let order = OrderActive {
            order_id: Set(record.order_id),
            order_date: Set(record.order_date),
            delivery_date: Set(record.delivery_date),
            pickup_point_id: Set(pickup_point_id),
            client_id: Set(client_id),
            code: Set(record.code),
            status: Set(record.status),
        }
        .insert(&txn)
        .await?;

        for (sku, quantity) in record.items {
            OrderItemActive {
                order_id: Set(order.order_id),
                product_sku: Set(sku),
                quantity: Set(quantity),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            summary.order_items += 1;
        }
        summary.orders += 1;
    }

    txn.commit().await?;
    Ok((summary, stale))
}
