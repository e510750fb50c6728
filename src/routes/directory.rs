use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};

use crate::{
    dto::directory::{CreatePickupPointRequest, PickupPointList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{PickupPoint, User},
    response::ApiResponse,
    services::directory_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/pickup-points",
            get(list_pickup_points).post(create_pickup_point),
        )
        .route("/pickup-points/{id}", delete(delete_pickup_point))
        .route("/users", get(list_users))
        .route("/users/{id}", delete(delete_user))
}

#[utoipa::path(
    get,
    path = "/api/pickup-points",
    responses(
        (status = 200, description = "Pickup points", body = ApiResponse<PickupPointList>)
    ),
    tag = "Directory"
)]
pub async fn list_pickup_points(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<ApiResponse<PickupPointList>>> {
    let resp = directory_service::list_pickup_points(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/pickup-points",
    request_body = CreatePickupPointRequest,
    responses(
        (status = 200, description = "Pickup point created", body = ApiResponse<PickupPoint>),
        (status = 422, description = "Empty address")
    ),
    tag = "Directory"
)]
pub async fn create_pickup_point(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePickupPointRequest>,
) -> AppResult<Json<ApiResponse<PickupPoint>>> {
    let resp = directory_service::create_pickup_point(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/pickup-points/{id}",
    params(
        ("id" = i32, Path, description = "Pickup point ID")
    ),
    responses(
        (status = 200, description = "Pickup point deleted"),
        (status = 409, description = "Orders still use this pickup point")
    ),
    tag = "Directory"
)]
pub async fn delete_pickup_point(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = directory_service::delete_pickup_point(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "User accounts", body = ApiResponse<Vec<User>>)
    ),
    tag = "Directory"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<User>>>> {
    let resp = directory_service::list_users(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted; their orders remain without a client"),
        (status = 403, description = "Superusers cannot be deleted")
    ),
    tag = "Directory"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = directory_service::delete_user(&state, &user, id).await?;
    Ok(Json(resp))
}
