use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    routing::{get, put},
};

use crate::{
    dto::products::{ProductForm, ProductFormChoices, ProductList},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::ApiResponse,
    routes::params::ProductListQuery,
    services::product_service,
    state::AppState,
};

/// Multipart field carrying the photo file.
const PHOTO_FIELD: &str = "photo";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/form-choices", get(form_choices))
        .route(
            "/{sku}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/{sku}/photo", put(upload_photo).delete(delete_photo))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("search" = Option<String>, Query, description = "Case-insensitive text in name, description, manufacturer or category"),
        ("supplier" = Option<String>, Query, description = "Exact supplier name"),
        ("ordering" = Option<String>, Query, description = "`stock` or `-stock`"),
    ),
    responses(
        (status = 200, description = "List products", body = ApiResponse<ProductList>),
        (status = 401, description = "Not logged in")
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<ProductListQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{sku}",
    params(
        ("sku" = String, Path, description = "Product SKU")
    ),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(sku): Path<String>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::get_product(&state, &sku).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/form-choices",
    responses(
        (status = 200, description = "Category and manufacturer options", body = ApiResponse<ProductFormChoices>),
        (status = 403, description = "Not an administrator")
    ),
    tag = "Products"
)]
pub async fn form_choices(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ProductFormChoices>>> {
    let resp = product_service::form_choices(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = ProductForm,
    responses(
        (status = 200, description = "Create product", body = ApiResponse<Product>),
        (status = 403, description = "Not an administrator"),
        (status = 422, description = "Invalid product fields")
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ProductForm>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::create_product(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/products/{sku}",
    params(
        ("sku" = String, Path, description = "Product SKU")
    ),
    request_body = ProductForm,
    responses(
        (status = 200, description = "Updated product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
        (status = 422, description = "Invalid product fields")
    ),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sku): Path<String>,
    Json(payload): Json<ProductForm>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::update_product(&state, &user, &sku, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/products/{sku}",
    params(
        ("sku" = String, Path, description = "Product SKU")
    ),
    responses(
        (status = 200, description = "Deleted product"),
        (status = 409, description = "Product is part of an order")
    ),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sku): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_product(&state, &user, &sku).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/products/{sku}/photo",
    params(
        ("sku" = String, Path, description = "Product SKU")
    ),
    request_body(content_type = "multipart/form-data", description = "Form with a `photo` file field"),
    responses(
        (status = 200, description = "Photo replaced", body = ApiResponse<Product>),
        (status = 400, description = "No photo field in the form")
    ),
    tag = "Products"
)]
pub async fn upload_photo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sku): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<Product>>> {
    // Refuse before the body is read.
    ensure_admin(&user)?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let resp =
            product_service::set_photo(&state, &user, &sku, file_name, bytes.to_vec()).await?;
        return Ok(Json(resp));
    }
    Err(AppError::BadRequest(format!(
        "Missing multipart field {PHOTO_FIELD:?}"
    )))
}

#[utoipa::path(
    delete,
    path = "/api/products/{sku}/photo",
    params(
        ("sku" = String, Path, description = "Product SKU")
    ),
    responses(
        (status = 200, description = "Photo removed", body = ApiResponse<Product>)
    ),
    tag = "Products"
)]
pub async fn delete_photo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sku): Path<String>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::clear_photo(&state, &user, &sku).await?;
    Ok(Json(resp))
}
