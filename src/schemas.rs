//! Request and response payloads of the HTTP API.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Order, OrderItem};
use crate::services::{CreateOrderInput, NewOrderItem};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Order identifier assigned by the source system. `pedidoId` is accepted as an alias.
    #[serde(default, alias = "pedidoId")]
    #[schema(example = "PED-2024-0001")]
    pub external_id: String,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    #[serde(default)]
    #[schema(example = "Product A")]
    pub product_name: String,
    #[serde(default)]
    #[schema(example = 2)]
    pub quantity: i32,
    /// Accepts a JSON number or a decimal string.
    #[serde(deserialize_with = "decimal::deserialize")]
    #[schema(value_type = String, example = "50.00")]
    pub unit_price: BigDecimal,
}

impl From<CreateOrderRequest> for CreateOrderInput {
    fn from(request: CreateOrderRequest) -> Self {
        Self {
            external_id: request.external_id,
            items: request
                .items
                .into_iter()
                .map(|item| NewOrderItem {
                    product_name: item.product_name,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    #[schema(value_type = String, example = "50.00")]
    pub unit_price: BigDecimal,
    /// quantity × unitPrice
    #[schema(value_type = String, example = "100.00")]
    pub total_price: BigDecimal,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: item.id(),
            product_name: item.product_name().to_string(),
            quantity: item.quantity(),
            unit_price: item.unit_price().clone(),
            total_price: item.total_price(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub external_id: String,
    pub items: Vec<OrderItemResponse>,
    /// Sum of item totals, before tax.
    #[schema(value_type = String, example = "125.00")]
    pub total_amount: BigDecimal,
    #[schema(value_type = Option<String>, example = "37.50")]
    pub tax_amount: Option<BigDecimal>,
    #[schema(example = "Processed")]
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id(),
            external_id: order.external_id().to_string(),
            items: order.items().iter().map(OrderItemResponse::from).collect(),
            total_amount: order.total_amount().clone(),
            tax_amount: order.tax_amount().cloned(),
            status: order.status().to_string(),
            created_at: order.created_at(),
            processed_at: order.processed_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Order.NotFound")]
    pub code: String,
    pub error: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

mod decimal {
    use bigdecimal::BigDecimal;
    use serde::{Deserialize, Deserializer};

    use crate::validation::AMOUNT_INPUT_MAX_LEN;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(serde_json::Number),
        Text(String),
    }

    // Numbers go through their shortest textual form so 0.1 stays 0.1.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = match Raw::deserialize(deserializer)? {
            Raw::Number(number) => number.to_string(),
            Raw::Text(text) => text,
        };
        let text = text.trim();
        if text.len() > AMOUNT_INPUT_MAX_LEN {
            return Err(serde::de::Error::custom(format!(
                "amount must not exceed {} characters",
                AMOUNT_INPUT_MAX_LEN
            )));
        }
        text.parse::<BigDecimal>().map_err(serde::de::Error::custom)
    }
}
