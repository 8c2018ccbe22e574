//! Order aggregate.
//! An order and its line items form one consistency unit. Fields are private;
//! the workflow drives the aggregate only through the transition operations.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const EXTERNAL_ID_MAX_LEN: usize = 50;
pub const PRODUCT_NAME_MAX_LEN: usize = 200;
/// Unit prices fit `NUMERIC(18, 2)`.
pub const UNIT_PRICE_MAX_SCALE: i64 = 2;
pub const UNIT_PRICE_MAX_INTEGER_DIGITS: i64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Processing,
    Processed,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Processed => "Processed",
            OrderStatus::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Processed | OrderStatus::Failed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "Processing" => Ok(OrderStatus::Processing),
            "Processed" => Ok(OrderStatus::Processed),
            "Failed" => Ok(OrderStatus::Failed),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("External identifier is required.")]
    EmptyExternalId,

    #[error("External identifier must not exceed 50 characters.")]
    ExternalIdTooLong,

    #[error("At least one item is required.")]
    EmptyItems,

    #[error("Product name is required.")]
    EmptyProductName,

    #[error("Quantity must be greater than 0, got {0}.")]
    NonPositiveQuantity(i32),

    #[error("Unit price must be greater than 0, got {0}.")]
    NonPositiveUnitPrice(BigDecimal),

    #[error("Unit price must have at most 2 decimal places and 16 integer digits.")]
    UnitPriceOutOfRange,

    #[error("Cannot transition order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Tax has already been applied to this order")]
    TaxAlreadyApplied,

    #[error("Cannot apply tax to an order in status {0}")]
    TaxOnTerminalOrder(OrderStatus),

    #[error("Order cannot be processed before tax is applied")]
    TaxNotApplied,

    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
}

impl OrderError {
    /// True for violations of the order's input invariants, as opposed to workflow misuse.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            OrderError::EmptyExternalId
                | OrderError::ExternalIdTooLong
                | OrderError::EmptyItems
                | OrderError::EmptyProductName
                | OrderError::NonPositiveQuantity(_)
                | OrderError::NonPositiveUnitPrice(_)
                | OrderError::UnitPriceOutOfRange
        )
    }
}

/// True when `price` has at most `UNIT_PRICE_MAX_SCALE` decimal places and
/// `UNIT_PRICE_MAX_INTEGER_DIGITS` integer digits, ignoring trailing zeros.
/// Inspects the digits and exponent only; never rescales.
pub fn unit_price_in_range(price: &BigDecimal) -> bool {
    let (mantissa, exponent) = price.as_bigint_and_exponent();
    let text = mantissa.to_string();
    let digits = text.trim_start_matches('-');
    let significant = digits.trim_end_matches('0');
    if significant.is_empty() {
        return true;
    }

    let scale = exponent - (digits.len() - significant.len()) as i64;
    let integer_digits = significant.len() as i64 - scale;
    scale <= UNIT_PRICE_MAX_SCALE && integer_digits <= UNIT_PRICE_MAX_INTEGER_DIGITS
}

/// One line within an order. Immutable after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    id: Uuid,
    product_name: String,
    quantity: i32,
    unit_price: BigDecimal,
}

impl OrderItem {
    pub fn new(
        product_name: impl Into<String>,
        quantity: i32,
        unit_price: BigDecimal,
    ) -> Result<Self, OrderError> {
        let product_name = product_name.into();
        if product_name.trim().is_empty() {
            return Err(OrderError::EmptyProductName);
        }
        if quantity <= 0 {
            return Err(OrderError::NonPositiveQuantity(quantity));
        }
        // Checked before any comparison; comparing rescales to a common exponent.
        if !unit_price_in_range(&unit_price) {
            return Err(OrderError::UnitPriceOutOfRange);
        }
        if unit_price <= BigDecimal::from(0) {
            return Err(OrderError::NonPositiveUnitPrice(unit_price));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            product_name,
            quantity,
            unit_price,
        })
    }

    pub(crate) fn restore(
        id: Uuid,
        product_name: String,
        quantity: i32,
        unit_price: BigDecimal,
    ) -> Self {
        Self {
            id,
            product_name,
            quantity,
            unit_price,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn unit_price(&self) -> &BigDecimal {
        &self.unit_price
    }

    pub fn total_price(&self) -> BigDecimal {
        BigDecimal::from(self.quantity) * &self.unit_price
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    id: Uuid,
    external_id: String,
    items: Vec<OrderItem>,
    total_amount: BigDecimal,
    tax_amount: Option<BigDecimal>,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

/// Stored representation used by repository adapters to rebuild an order.
pub(crate) struct OrderRecord {
    pub id: Uuid,
    pub external_id: String,
    pub items: Vec<OrderItem>,
    pub total_amount: BigDecimal,
    pub tax_amount: Option<BigDecimal>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Builds a new order in `Pending` with its total computed from the items.
    pub fn create(external_id: impl Into<String>, items: Vec<OrderItem>) -> Result<Self, OrderError> {
        let external_id = external_id.into();
        if external_id.trim().is_empty() {
            return Err(OrderError::EmptyExternalId);
        }
        if external_id.chars().count() > EXTERNAL_ID_MAX_LEN {
            return Err(OrderError::ExternalIdTooLong);
        }
        if items.is_empty() {
            return Err(OrderError::EmptyItems);
        }

        let total_amount = items
            .iter()
            .fold(BigDecimal::from(0), |acc, item| acc + item.total_price());

        Ok(Self {
            id: Uuid::new_v4(),
            external_id,
            items,
            total_amount,
            tax_amount: None,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            processed_at: None,
        })
    }

    pub(crate) fn restore(record: OrderRecord) -> Self {
        Self {
            id: record.id,
            external_id: record.external_id,
            items: record.items,
            total_amount: record.total_amount,
            tax_amount: record.tax_amount,
            status: record.status,
            created_at: record.created_at,
            processed_at: record.processed_at,
        }
    }

    pub fn mark_as_processing(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Processing, &[OrderStatus::Pending])
    }

    /// Sets the tax amount. Valid once, and only before a terminal state.
    pub fn apply_tax(&mut self, tax_amount: BigDecimal) -> Result<(), OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::TaxOnTerminalOrder(self.status));
        }
        if self.tax_amount.is_some() {
            return Err(OrderError::TaxAlreadyApplied);
        }
        self.tax_amount = Some(tax_amount);
        Ok(())
    }

    pub fn mark_as_processed(&mut self) -> Result<(), OrderError> {
        if self.status == OrderStatus::Processing && self.tax_amount.is_none() {
            return Err(OrderError::TaxNotApplied);
        }
        self.transition(OrderStatus::Processed, &[OrderStatus::Processing])?;
        // Wall clock may step backwards between construction and now.
        self.processed_at = Some(Utc::now().max(self.created_at));
        Ok(())
    }

    pub fn mark_as_failed(&mut self) -> Result<(), OrderError> {
        self.transition(
            OrderStatus::Failed,
            &[OrderStatus::Pending, OrderStatus::Processing],
        )
    }

    fn transition(&mut self, to: OrderStatus, allowed_from: &[OrderStatus]) -> Result<(), OrderError> {
        if !allowed_from.contains(&self.status) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total_amount(&self) -> &BigDecimal {
        &self.total_amount
    }

    pub fn tax_amount(&self) -> Option<&BigDecimal> {
        self.tax_amount.as_ref()
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }
}
