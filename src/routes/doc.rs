use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse},
        directory::{CreatePickupPointRequest, PickupPointList},
        orders::{OrderList, OrderWithItems},
        products::{FieldChoice, ProductForm, ProductFormChoices, ProductList},
    },
    models::{Order, OrderItem, PickupPoint, Product, Role, User},
    response::{ApiResponse, Meta},
    routes::{auth, directory, health, orders, params, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::guest,
        auth::logout,
        products::list_products,
        products::get_product,
        products::form_choices,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::upload_photo,
        products::delete_photo,
        orders::list_orders,
        orders::get_order,
        orders::delete_order,
        directory::list_pickup_points,
        directory::create_pickup_point,
        directory::delete_pickup_point,
        directory::list_users,
        directory::delete_user
    ),
    components(
        schemas(
            Role,
            User,
            PickupPoint,
            Product,
            Order,
            OrderItem,
            LoginRequest,
            LoginResponse,
            ProductForm,
            ProductList,
            FieldChoice,
            ProductFormChoices,
            OrderList,
            OrderWithItems,
            CreatePickupPointRequest,
            PickupPointList,
            params::StockOrdering,
            params::ProductListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<LoginResponse>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Catalog listing and maintenance"),
        (name = "Orders", description = "Order views"),
        (name = "Directory", description = "Pickup points and user accounts"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
