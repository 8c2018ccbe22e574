use bigdecimal::BigDecimal;
use std::fmt;

use crate::domain::order::{
    EXTERNAL_ID_MAX_LEN, PRODUCT_NAME_MAX_LEN, UNIT_PRICE_MAX_INTEGER_DIGITS, UNIT_PRICE_MAX_SCALE,
    unit_price_in_range,
};

/// Longest textual amount accepted from a request body.
pub const AMOUNT_INPUT_MAX_LEN: usize = 64;
use crate::schemas::{CreateOrderRequest, FieldError, OrderItemRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for FieldError {
    fn from(err: ValidationError) -> Self {
        FieldError {
            field: err.field,
            message: err.message,
        }
    }
}

pub type ValidationResult = Result<(), ValidationError>;

pub fn validate_required(field: &str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "is required."));
    }

    Ok(())
}

pub fn validate_max_len(field: &str, value: &str, max_len: usize) -> ValidationResult {
    if value.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must not exceed {} characters.", max_len),
        ));
    }

    Ok(())
}

pub fn validate_positive_quantity(field: &str, quantity: i32) -> ValidationResult {
    if quantity <= 0 {
        return Err(ValidationError::new(field, "must be greater than 0."));
    }

    Ok(())
}

/// Bounds first, sign second: the sign check compares at a common scale.
pub fn validate_positive_amount(field: &str, amount: &BigDecimal) -> ValidationResult {
    if !unit_price_in_range(amount) {
        return Err(ValidationError::new(
            field,
            format!(
                "must have at most {} decimal places and {} integer digits.",
                UNIT_PRICE_MAX_SCALE, UNIT_PRICE_MAX_INTEGER_DIGITS
            ),
        ));
    }
    if amount <= &BigDecimal::from(0) {
        return Err(ValidationError::new(field, "must be greater than 0."));
    }

    Ok(())
}

fn validate_item(index: usize, item: &OrderItemRequest, errors: &mut Vec<ValidationError>) {
    let field = |name: &str| format!("items[{}].{}", index, name);

    let checks = [
        validate_required(&field("productName"), &item.product_name).and_then(|_| {
            validate_max_len(&field("productName"), &item.product_name, PRODUCT_NAME_MAX_LEN)
        }),
        validate_positive_quantity(&field("quantity"), item.quantity),
        validate_positive_amount(&field("unitPrice"), &item.unit_price),
    ];
    errors.extend(checks.into_iter().filter_map(Result::err));
}

/// Shape validation for an inbound order. Reports every violation, not just the first.
pub fn validate_create_order(request: &CreateOrderRequest) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = validate_required("externalId", &request.external_id)
        .and_then(|_| validate_max_len("externalId", &request.external_id, EXTERNAL_ID_MAX_LEN))
    {
        errors.push(e);
    }

    if request.items.is_empty() {
        errors.push(ValidationError::new("items", "at least one item is required."));
    }

    for (index, item) in request.items.iter().enumerate() {
        validate_item(index, item, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
