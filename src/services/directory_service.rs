use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::{
    dto::directory::{CreatePickupPointRequest, PickupPointList},
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        pickup_points::{ActiveModel as PickupPointActive, Column as PickupPointCol, Entity as PickupPoints},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure},
    models::{PickupPoint, Role, User},
    response::{ApiResponse, Meta},
    services::auth_service::user_from_entity,
    state::AppState,
};

pub async fn list_pickup_points(state: &AppState) -> AppResult<ApiResponse<PickupPointList>> {
    let items: Vec<PickupPoint> = PickupPoints::find()
        .order_by_asc(PickupPointCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| PickupPoint {
            id: p.id,
            address: p.address,
        })
        .collect();
    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success(
        "Pickup points",
        PickupPointList { items },
        Some(meta),
    ))
}

pub async fn create_pickup_point(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePickupPointRequest,
) -> AppResult<ApiResponse<PickupPoint>> {
    ensure(user, Role::can_manage_directory)?;
    let address = payload.address.trim().to_string();
    if address.is_empty() {
        return Err(AppError::Validation("Address is required".into()));
    }
    let created = PickupPointActive {
        address: Set(address),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;
    tracing::info!(user_id = user.user_id, pickup_point_id = created.id, "pickup point created");

    Ok(ApiResponse::success(
        "Pickup point created",
        PickupPoint {
            id: created.id,
            address: created.address,
        },
        Some(Meta::empty()),
    ))
}

/// Pickup points stay while any order still points at them.
pub async fn delete_pickup_point(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure(user, Role::can_manage_directory)?;
    let txn = state.orm.begin().await?;

    let in_use = Orders::find()
        .filter(OrderCol::PickupPointId.eq(id))
        .count(&txn)
        .await?;
    if in_use > 0 {
        return Err(AppError::PickupPointInUse);
    }

    let result = PickupPoints::delete_by_id(id)
        .exec(&txn)
        .await
        .map_err(|err| {
            if AppError::is_foreign_key_violation(&err) {
                AppError::PickupPointInUse
            } else {
                AppError::from(err)
            }
        })?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_users(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Vec<User>>> {
    ensure(user, Role::can_manage_directory)?;
    let items: Vec<User> = Users::find()
        .order_by_asc(UserCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(user_from_entity)
        .collect();
    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("Users", items, Some(meta)))
}

/// Removes an account. Orders of that client remain, without a client.
pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure(user, Role::can_manage_directory)?;
    let target = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if target.is_superuser {
        return Err(AppError::Forbidden);
    }

    Users::delete_by_id(id).exec(&state.orm).await?;
    tracing::info!(user_id = user.user_id, deleted_user_id = id, "user deleted");

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
