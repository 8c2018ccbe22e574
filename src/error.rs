use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::domain::{DomainError, ErrorKind};
use crate::ports::RepositoryError;
use crate::schemas::{ErrorResponse, FieldError};
use crate::services::OrderServiceError;
use crate::validation::ValidationError;

pub const VALIDATION_CODE: &str = "Order.Validation";
pub const INTERNAL_CODE: &str = "Internal.Error";
const INTERNAL_MESSAGE: &str = "An unexpected error occurred.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{}", .0.message())]
    Domain(DomainError),

    #[error("Validation error: {}", summarize(.0))]
    Validation(Vec<ValidationError>),

    #[error("Invalid request body: {0}")]
    BadRequest(String),

    #[error("Order store error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::Domain(err)
    }
}

impl From<OrderServiceError> for AppError {
    fn from(err: OrderServiceError) -> Self {
        match err {
            OrderServiceError::Rejected(e) => AppError::Domain(e),
            OrderServiceError::Repository(e) => AppError::Repository(e),
            OrderServiceError::NotPersisted { source, .. } => AppError::Repository(source),
            OrderServiceError::State(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Domain(e) => match e.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Duplicate => StatusCode::CONFLICT,
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
            },
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Repository(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &str {
        match self {
            AppError::Domain(e) => e.code(),
            AppError::Validation(_) | AppError::BadRequest(_) => VALIDATION_CODE,
            AppError::Repository(_) | AppError::Internal(_) => INTERNAL_CODE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (error, errors) = match &self {
            AppError::Repository(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                (INTERNAL_MESSAGE.to_string(), None)
            }
            AppError::Validation(errors) => (
                "One or more validation errors occurred.".to_string(),
                Some(errors.iter().cloned().map(FieldError::from).collect()),
            ),
            other => (other.to_string(), None),
        };

        let body = Json(ErrorResponse {
            code: self.code().to_string(),
            error,
            status: status.as_u16(),
            errors,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::order_errors;
    use uuid::Uuid;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_not_found_error_status_code() {
        let error = AppError::from(order_errors::not_found(Uuid::new_v4()));
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_duplicate_error_status_code() {
        let error = AppError::from(order_errors::duplicate("PED-1"));
        assert_eq!(error.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_domain_validation_error_status_code() {
        let error = AppError::from(order_errors::validation("bad"));
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_unknown_code_suffix_is_bad_request() {
        let error = AppError::from(DomainError::new("Order.Unexpected", "odd"));
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_repository_error_status_code() {
        let error = AppError::Repository(RepositoryError::Database(sqlx::Error::RowNotFound));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_bad_request_error_status_code() {
        let error = AppError::BadRequest("expected value".to_string());
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_domain_error_response_body() {
        let response = AppError::from(order_errors::duplicate("PED-1")).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_json(response).await;
        assert_eq!(body["code"], "Order.Duplicate");
        assert_eq!(body["status"], 409);
        assert!(body["error"].as_str().unwrap().contains("PED-1"));
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_validation_error_response_lists_fields() {
        let error = AppError::Validation(vec![
            ValidationError::new("externalId", "is required."),
            ValidationError::new("items", "at least one item is required."),
        ]);
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["code"], VALIDATION_CODE);
        assert_eq!(body["errors"][0]["field"], "externalId");
        assert_eq!(body["errors"][1]["field"], "items");
    }

    #[test]
    fn test_unpersisted_order_is_internal_error() {
        let item = crate::domain::OrderItem::new("Product", 1, "10.00".parse().unwrap()).unwrap();
        let mut order = crate::domain::Order::create("PED-1", vec![item]).unwrap();
        order.mark_as_failed().unwrap();

        let error = AppError::from(OrderServiceError::NotPersisted {
            order: Box::new(order),
            source: RepositoryError::Database(sqlx::Error::PoolTimedOut),
        });
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.code(), INTERNAL_CODE);
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let error = AppError::Repository(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["code"], INTERNAL_CODE);
        assert_eq!(body["error"], INTERNAL_MESSAGE);
    }
}
