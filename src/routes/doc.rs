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
    domain::lifecycle::{DisplayStatus, OrderStage, StatusStep},
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        orders::{
            AdminOrderSummary, OrderDetail, OrderLineRequest, OrderList, PaymentFragment,
            PlaceOrderRequest, ProcessingFragment, SetPaymentRequest, SetProcessedRequest,
            SetShippedRequest, ShippingFragment,
        },
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
    },
    models::{Order, OrderItem, PaymentMethod, PaymentStatus, Product, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, health, orders, params, products},
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
        auth::register,
        products::list_products,
        products::create_product,
        products::get_product,
        products::update_product,
        orders::place_order,
        orders::list_orders,
        orders::get_order,
        admin::set_payment,
        admin::set_processed,
        admin::set_shipped,
    ),
    components(
        schemas(
            User,
            Product,
            Order,
            OrderItem,
            PaymentMethod,
            PaymentStatus,
            OrderStage,
            StatusStep,
            DisplayStatus,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            OrderLineRequest,
            PlaceOrderRequest,
            OrderDetail,
            AdminOrderSummary,
            OrderList,
            SetPaymentRequest,
            SetProcessedRequest,
            SetShippedRequest,
            PaymentFragment,
            ProcessingFragment,
            ShippingFragment,
            params::Pagination,
            params::ProductQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Order>,
            ApiResponse<OrderDetail>,
            ApiResponse<OrderList>,
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Admin", description = "Order lifecycle transitions"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
