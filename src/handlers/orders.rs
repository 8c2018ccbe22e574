use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, header},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::AppState;
use crate::error::AppError;
use crate::schemas::{CreateOrderRequest, ErrorResponse, OrderResponse};
use crate::validation;

fn to_responses(orders: &[crate::domain::Order]) -> Vec<OrderResponse> {
    orders.iter().map(OrderResponse::from).collect()
}

/// Receives an order from the source system, computes its tax, and stores it.
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created and processed", body = OrderResponse),
        (status = 400, description = "Malformed or invalid order", body = ErrorResponse),
        (status = 409, description = "An order with this external identifier already exists", body = ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    validation::validate_create_order(&request).map_err(AppError::Validation)?;

    tracing::info!(
        external_id = %request.external_id,
        items = request.items.len(),
        "Creating order"
    );

    let order = state.orders.create_order(request.into()).await?;
    let location = format!("/api/orders/{}", order.id());

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(OrderResponse::from(&order)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Internal order identifier")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 400, description = "Malformed identifier", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn get_order_by_id(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let order = state.orders.get_order_by_id(id).await?;

    Ok(Json(OrderResponse::from(&order)))
}

/// Also routed at `/api/orders/pedido/{external_id}` for source-system callers.
#[utoipa::path(
    get,
    path = "/api/orders/external/{external_id}",
    params(("external_id" = String, Path, description = "Identifier assigned by the source system")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn get_order_by_external_id(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.orders.get_order_by_external_id(&external_id).await?;

    Ok(Json(OrderResponse::from(&order)))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses((status = 200, description = "All stored orders", body = [OrderResponse])),
    tag = "Orders"
)]
pub async fn list_orders(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let orders = state.orders.list_all_orders().await?;

    Ok(Json(to_responses(&orders)))
}

/// Orders ready for the downstream consumer.
#[utoipa::path(
    get,
    path = "/api/orders/processed",
    responses((status = 200, description = "Orders in Processed status", body = [OrderResponse])),
    tag = "Orders"
)]
pub async fn list_processed_orders(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("Retrieving processed orders");
    let orders = state.orders.list_processed_orders().await?;

    Ok(Json(to_responses(&orders)))
}
