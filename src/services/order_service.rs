use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};

use crate::{
    dto::orders::{OrderList, OrderWithItems},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        orders::{Column as OrderCol, Entity as Orders, Model as OrderModel},
        pickup_points::Entity as PickupPoints,
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure},
    models::{Order, OrderItem, Role},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    ensure(user, Role::can_view_orders)?;

    let rows = Orders::find()
        .order_by_asc(OrderCol::OrderId)
        .find_with_related(OrderItems)
        .all(&state.orm)
        .await?;

    let addresses: HashMap<i32, String> = PickupPoints::find()
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| (p.id, p.address))
        .collect();
    let names: HashMap<i32, String> = Users::find()
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|u| (u.id, u.display_name()))
        .collect();

    let items: Vec<OrderWithItems> = rows
        .into_iter()
        .map(|(order, items)| OrderWithItems {
            pickup_address: addresses
                .get(&order.pickup_point_id)
                .cloned()
                .unwrap_or_default(),
            client_name: order.client_id.and_then(|id| names.get(&id).cloned()),
            order: order_from_entity(order),
            items: items.into_iter().map(order_item_from_entity).collect(),
        })
        .collect();

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure(user, Role::can_view_orders)?;

    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let pickup_address = order
        .find_related(PickupPoints)
        .one(&state.orm)
        .await?
        .map(|p| p.address)
        .unwrap_or_default();
    let client_name = order
        .find_related(Users)
        .one(&state.orm)
        .await?
        .map(|u| u.display_name());
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.order_id))
        .order_by_asc(OrderItemCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            pickup_address,
            client_name,
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Removes an order together with its line items.
pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure(user, Role::can_manage_directory)?;
    let txn = state.orm.begin().await?;

    let removed_items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(id))
        .count(&txn)
        .await?;
    // Line items go with the order through the cascading foreign key.
    let result = Orders::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    txn.commit().await?;

    tracing::info!(user_id = user.user_id, order_id = id, removed_items, "order deleted");

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "removed_items": removed_items }),
        Some(Meta::empty()),
    ))
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        order_id: model.order_id,
        order_date: model.order_date,
        delivery_date: model.delivery_date,
        pickup_point_id: model.pickup_point_id,
        client_id: model.client_id,
        code: model.code,
        status: model.status,
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_sku: model.product_sku,
        quantity: model.quantity,
    }
}
