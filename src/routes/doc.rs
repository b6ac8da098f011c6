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
    domain::lifecycle::{CancelledBy, OrderStatus, PaymentMethod},
    domain::pricing::Pricing,
    dto::{
        auth,
        orders::{
            CreateOrderRequest, DeliveryRequest, Fulfillment, OrderItemRequest, OrderList,
            OrderWithItems, RateOrderRequest, UpdateOrderStatusRequest,
        },
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        vendors::{CreateVendorRequest, ReviewVendorRequest, UpdateVendorRequest, VendorList},
    },
    models::{
        Cancellation, DeliveryInfo, Order, OrderItem, OrderRating, PaymentInfo, Product,
        RatingSummary, Timeline, User, Vendor,
    },
    response::{ApiResponse, Meta},
    routes::{admin, auth as auth_routes, health, orders, params, products, vendors},
    services::admin_service,
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
        auth_routes::register,
        auth_routes::login,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        vendors::create_vendor,
        vendors::my_vendor,
        vendors::update_vendor,
        vendors::get_vendor,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_order_status,
        orders::rate_order,
        admin::platform_stats,
        admin::list_pending_vendors,
        admin::review_vendor,
        admin::list_all_orders,
        admin::get_order_admin
    ),
    components(
        schemas(
            User,
            Vendor,
            Product,
            Order,
            OrderItem,
            Pricing,
            Timeline,
            PaymentInfo,
            DeliveryInfo,
            OrderRating,
            Cancellation,
            RatingSummary,
            OrderStatus,
            PaymentMethod,
            CancelledBy,
            Fulfillment,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::LoginResponse,
            CreateOrderRequest,
            OrderItemRequest,
            DeliveryRequest,
            UpdateOrderStatusRequest,
            RateOrderRequest,
            OrderList,
            OrderWithItems,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CreateVendorRequest,
            UpdateVendorRequest,
            ReviewVendorRequest,
            VendorList,
            admin_service::PlatformStats,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::AdminOrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Vendor>,
            ApiResponse<VendorList>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<admin_service::PlatformStats>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Product catalog and vendor product management"),
        (name = "Vendors", description = "Vendor profile endpoints"),
        (name = "Orders", description = "Order lifecycle and rating endpoints"),
        (name = "Admin", description = "Admin oversight endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
