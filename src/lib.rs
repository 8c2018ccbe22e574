pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod openapi;
pub mod ports;
pub mod schemas;
pub mod services;
pub mod validation;

use axum::{Router, routing::get};
use std::time::Instant;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::services::OrderService;

#[derive(Clone)]
pub struct AppState {
    pub orders: OrderService,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(orders: OrderService) -> Self {
        Self {
            orders,
            start_time: Instant::now(),
        }
    }
}

/// HTTP-layer settings that do not belong to the application state.
#[derive(Debug, Clone, Default)]
pub struct HttpOptions {
    pub cors_allowed_origins: Option<Vec<String>>,
    pub log_request_body: bool,
}

pub fn create_app(state: AppState, options: &HttpOptions) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route(
            "/api/orders/processed",
            get(handlers::orders::list_processed_orders),
        )
        .route("/api/orders/:id", get(handlers::orders::get_order_by_id))
        .route(
            "/api/orders/external/:external_id",
            get(handlers::orders::get_order_by_external_id),
        )
        .route(
            "/api/orders/pedido/:external_id",
            get(handlers::orders::get_order_by_external_id),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .layer(axum::middleware::from_fn_with_state(
            options.log_request_body,
            middleware::request_logger_middleware,
        ))
        .layer(middleware::cors_layer(options.cors_allowed_origins.as_deref()))
        .with_state(state)
}
