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
        categories::{CategoryList, CategoryPayload},
        orders::{CreateOrderRequest, OrderItemInput, OrderList, UpdateOrderStatusRequest},
        products::{ProductList, ProductQuery},
        users::{
            CreateUserRequest, FilteredUserList, LoginRequest, LoginResponse, UpdateUserRequest,
            UserList,
        },
    },
    models::{
        Category, FilteredUser, Order, OrderDetail, OrderItemDetail, OrderUser, Product, User,
    },
    response::{ApiResponse, CountData, Meta},
    routes::{categories, health, orders, products, users},
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
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::update_gallery,
        products::delete_product,
        products::product_count,
        products::featured_products,
        products::featured_products_limited,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        users::list_users,
        users::filtered_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        users::user_count,
        users::login,
        users::register,
        orders::list_orders,
        orders::get_order,
        orders::create_order,
        orders::update_order_status,
        orders::delete_order,
    ),
    components(
        schemas(
            Category,
            Product,
            User,
            FilteredUser,
            Order,
            OrderUser,
            OrderItemDetail,
            OrderDetail,
            CategoryPayload,
            CategoryList,
            ProductQuery,
            ProductList,
            CreateUserRequest,
            UpdateUserRequest,
            LoginRequest,
            LoginResponse,
            UserList,
            FilteredUserList,
            OrderItemInput,
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            OrderList,
            CountData,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Category>,
            ApiResponse<CategoryList>,
            ApiResponse<User>,
            ApiResponse<UserList>,
            ApiResponse<OrderDetail>,
            ApiResponse<OrderList>,
            ApiResponse<CountData>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Users", description = "User and authentication endpoints"),
        (name = "Orders", description = "Order endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
