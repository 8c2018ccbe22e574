use utoipa::OpenApi;

use crate::handlers;
use crate::health::{DependencyStatus, HealthResponse};
use crate::schemas::{
    CreateOrderRequest, ErrorResponse, FieldError, OrderItemRequest, OrderItemResponse,
    OrderResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Order Manager API",
        description = "Receives orders from the source system, applies tax, and serves processed orders to downstream consumers."
    ),
    paths(
        handlers::health,
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::list_processed_orders,
        handlers::orders::get_order_by_id,
        handlers::orders::get_order_by_external_id,
    ),
    components(schemas(
        CreateOrderRequest,
        OrderItemRequest,
        OrderResponse,
        OrderItemResponse,
        ErrorResponse,
        FieldError,
        HealthResponse,
        DependencyStatus,
    )),
    tags(
        (name = "Orders", description = "Order intake and retrieval"),
        (name = "Health", description = "Service health")
    )
)]
pub struct ApiDoc;
