use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};

use crate::{
    assets::StaleAssets,
    dto::products::{FieldChoice, ProductForm, ProductFormChoices, ProductList},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{PRICE_SCALE, Product, price_to_minor},
    response::{ApiResponse, Meta},
    routes::params::{ProductListQuery, StockOrdering},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductListQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let mut condition = Condition::all();

    if let Some(search) = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pattern = contains_pattern(search);
        condition = condition.add(
            Condition::any()
                .add(lower_like(Column::Name, &pattern))
                .add(lower_like(Column::Description, &pattern))
                .add(lower_like(Column::Manufacturer, &pattern))
                .add(lower_like(Column::Category, &pattern)),
        );
    }

    if let Some(supplier) = query.supplier.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Column::Supplier.eq(supplier.clone()));
    }

    let mut finder = Products::find().filter(condition);
    finder = match query.ordering {
        Some(StockOrdering::Asc) => finder.order_by_asc(Column::Stock),
        Some(StockOrdering::Desc) => finder.order_by_desc(Column::Stock),
        None => finder,
    };
    let items: Vec<Product> = finder
        .order_by_asc(Column::Sku)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, sku: &str) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(sku)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", product_from_entity(product), None))
}

/// Category and manufacturer options offered by the product form.
pub async fn form_choices(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ProductFormChoices>> {
    ensure_admin(user)?;
    let choices = load_form_choices(&state.orm).await?;
    Ok(ApiResponse::success("Form choices", choices, Some(Meta::empty())))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    form: ProductForm,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let sku = form.sku.trim().to_string();
    if sku.is_empty() {
        return Err(AppError::Validation("SKU is required".into()));
    }
    let choices = load_form_choices(&state.orm).await?;
    let price_minor = validate_form(&form, &choices)?;

    if Products::find_by_id(sku.as_str())
        .one(&state.orm)
        .await?
        .is_some()
    {
        return Err(AppError::Validation(format!(
            "Product with SKU {sku} already exists"
        )));
    }

    let active = ActiveModel {
        sku: Set(sku),
        name: Set(form.name),
        unit: Set(form.unit),
        price_minor: Set(price_minor),
        supplier: Set(form.supplier),
        manufacturer: Set(form.manufacturer),
        category: Set(form.category),
        discount: Set(form.discount),
        stock: Set(form.stock),
        description: Set(form.description),
        photo: Set(None),
    };
    let product = active.insert(&state.orm).await.map_err(|err| {
        if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            AppError::Validation("Product with this SKU already exists".into())
        } else {
            AppError::from(err)
        }
    })?;

    tracing::info!(user_id = user.user_id, sku = %product.sku, "product created");

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

/// Replaces every editable field. The SKU identifies the record and never changes.
pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    sku: &str,
    form: ProductForm,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(sku)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let submitted_sku = form.sku.trim();
    if !submitted_sku.is_empty() && submitted_sku != existing.sku {
        tracing::debug!(sku = %existing.sku, submitted = %submitted_sku, "ignoring SKU change");
    }

    let choices = load_form_choices(&state.orm).await?;
    let price_minor = validate_form(&form, &choices)?;

    let old_photo = existing.photo.clone();
    let mut active: ActiveModel = existing.into();
    active.name = Set(form.name);
    active.unit = Set(form.unit);
    active.price_minor = Set(price_minor);
    active.supplier = Set(form.supplier);
    active.manufacturer = Set(form.manufacturer);
    active.category = Set(form.category);
    active.discount = Set(form.discount);
    active.stock = Set(form.stock);
    active.description = Set(form.description);

    let product = active.update(&state.orm).await?;
    StaleAssets::on_change(old_photo, product.photo.as_deref())
        .release(&state.photos)
        .await;

    tracing::info!(user_id = user.user_id, sku = %product.sku, "product updated");

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

/// Deletes a product unless an order line still points at it.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    sku: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(sku)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if is_referenced(&txn, sku).await? {
        tracing::info!(sku = %sku, "refusing to delete product referenced by orders");
        return Err(AppError::ReferencedByOrder);
    }

    Products::delete_by_id(sku).exec(&txn).await.map_err(|err| {
        if AppError::is_foreign_key_violation(&err) {
            AppError::ReferencedByOrder
        } else {
            AppError::from(err)
        }
    })?;
    txn.commit().await?;

    StaleAssets::on_delete(product.photo)
        .release(&state.photos)
        .await;

    tracing::info!(user_id = user.user_id, sku = %sku, "product deleted");

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Stores a new photo file and points the product at it.
pub async fn set_photo(
    state: &AppState,
    user: &AuthUser,
    sku: &str,
    file_name: Option<String>,
    bytes: Vec<u8>,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if bytes.is_empty() {
        return Err(AppError::Validation("Photo file is empty".into()));
    }
    let existing = Products::find_by_id(sku)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let reference = state
        .photos
        .store(file_name.as_deref(), &bytes)
        .await
        .map_err(|err| AppError::Internal(err.into()))?;

    let product = match replace_photo(state, existing, Some(reference.clone())).await {
        Ok(product) => product,
        Err(err) => {
            // The new file never became reachable.
            StaleAssets::on_delete(Some(reference))
                .release(&state.photos)
                .await;
            return Err(err);
        }
    };

    Ok(ApiResponse::success(
        "Photo updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn clear_photo(
    state: &AppState,
    user: &AuthUser,
    sku: &str,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(sku)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let product = replace_photo(state, existing, None).await?;
    Ok(ApiResponse::success(
        "Photo removed",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

async fn replace_photo(
    state: &AppState,
    existing: ProductModel,
    photo: Option<String>,
) -> AppResult<ProductModel> {
    let old_photo = existing.photo.clone();
    let mut active: ActiveModel = existing.into();
    active.photo = Set(photo);
    let product = active.update(&state.orm).await?;

    StaleAssets::on_change(old_photo, product.photo.as_deref())
        .release(&state.photos)
        .await;
    Ok(product)
}

async fn is_referenced<C: ConnectionTrait>(conn: &C, sku: &str) -> AppResult<bool> {
    let count = OrderItems::find()
        .filter(OrderItemCol::ProductSku.eq(sku))
        .count(conn)
        .await?;
    Ok(count > 0)
}

async fn load_form_choices<C: ConnectionTrait>(conn: &C) -> AppResult<ProductFormChoices> {
    Ok(ProductFormChoices {
        category: FieldChoice::from_existing(distinct_values(conn, Column::Category).await?),
        manufacturer: FieldChoice::from_existing(
            distinct_values(conn, Column::Manufacturer).await?,
        ),
    })
}

async fn distinct_values<C: ConnectionTrait>(conn: &C, column: Column) -> AppResult<Vec<String>> {
    let values = Products::find()
        .select_only()
        .column(column)
        .distinct()
        .into_tuple::<String>()
        .all(conn)
        .await?;
    Ok(values)
}

/// Checks the submitted fields and returns the price in minor units.
fn validate_form(form: &ProductForm, choices: &ProductFormChoices) -> AppResult<i64> {
    if form.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    if form.unit.trim().is_empty() {
        return Err(AppError::Validation("Unit is required".into()));
    }
    if form.price < Decimal::ZERO {
        return Err(AppError::Validation("Price cannot be negative".into()));
    }
    if form.price.normalize().scale() > PRICE_SCALE {
        return Err(AppError::Validation(format!(
            "Price must have at most {PRICE_SCALE} decimal places"
        )));
    }
    let price_minor = price_to_minor(form.price)
        .ok_or_else(|| AppError::Validation("Price is out of range".into()))?;
    if !(0..=100).contains(&form.discount) {
        return Err(AppError::Validation(
            "Discount must be between 0 and 100".into(),
        ));
    }
    if form.stock < 0 {
        return Err(AppError::Validation("Stock cannot be negative".into()));
    }
    if !choices.category.accepts(&form.category) {
        return Err(AppError::Validation(format!(
            "Unknown category: {}",
            form.category
        )));
    }
    if !choices.manufacturer.accepts(&form.manufacturer) {
        return Err(AppError::Validation(format!(
            "Unknown manufacturer: {}",
            form.manufacturer
        )));
    }
    Ok(price_minor)
}

/// `%term%` with LIKE wildcards in the term escaped, lower-cased for a case-insensitive match.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn lower_like(column: Column, pattern: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(pattern).escape('\\'))
}

pub(crate) fn product_from_entity(model: ProductModel) -> Product {
    let price = model.price();
    let discounted_price = model.discounted_price();
    Product {
        sku: model.sku,
        name: model.name,
        unit: model.unit,
        price,
        discounted_price,
        supplier: model.supplier,
        manufacturer: model.manufacturer,
        category: model.category,
        discount: model.discount,
        stock: model.stock,
        description: model.description,
        photo: model.photo,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(price: Decimal) -> ProductForm {
        ProductForm {
            sku: "A1".into(),
            name: "Boots".into(),
            unit: "pcs".into(),
            price,
            supplier: "Acme".into(),
            manufacturer: String::new(),
            category: String::new(),
            discount: 0,
            stock: 0,
            description: String::new(),
        }
    }

    fn free_text() -> ProductFormChoices {
        ProductFormChoices {
            category: FieldChoice::FreeText,
            manufacturer: FieldChoice::FreeText,
        }
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = validate_form(&form(Decimal::new(-1, 2)), &free_text()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(validate_form(&form(Decimal::ZERO), &free_text()).unwrap(), 0);
        assert_eq!(
            validate_form(&form(Decimal::new(1050, 1)), &free_text()).unwrap(),
            10500
        );
    }

    #[test]
    fn price_keeps_at_most_two_decimals() {
        let err = validate_form(&form(Decimal::new(1005, 3)), &free_text()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        // Trailing zeros do not count.
        assert_eq!(
            validate_form(&form(Decimal::new(10500, 3)), &free_text()).unwrap(),
            1050
        );
    }

    #[test]
    fn closed_choice_lists_reject_new_values() {
        let choices = ProductFormChoices {
            category: FieldChoice::from_existing(vec!["Shoes".into()]),
            manufacturer: FieldChoice::FreeText,
        };
        let mut f = form(Decimal::ONE);
        f.category = "Hats".into();
        assert!(validate_form(&f, &choices).is_err());
        f.category = "Shoes".into();
        assert!(validate_form(&f, &choices).is_ok());
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Boot"), "%boot%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }
}
