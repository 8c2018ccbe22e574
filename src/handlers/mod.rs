pub mod orders;

use crate::health::{check_health, DependencyChecker, HealthResponse, OrderStoreChecker};
use crate::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let checkers: Vec<Box<dyn DependencyChecker>> = vec![Box::new(OrderStoreChecker::new(
        state.orders.repository().clone(),
    ))];

    let response = check_health(&checkers, state.start_time).await;

    // Return 503 if the order store is down, 200 otherwise
    let status_code = if response.status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
