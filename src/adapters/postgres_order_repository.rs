//! Postgres implementation of OrderRepository.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::order::OrderRecord;
use crate::domain::{Order, OrderItem, OrderStatus};
use crate::ports::{OrderRepository, RepositoryError, RepositoryResult};

const ORDER_COLUMNS: &str =
    "id, external_id, total_amount, tax_amount, status, created_at, processed_at";

/// Postgres-backed order repository.
/// External-id uniqueness is enforced by the `orders_external_id_key` constraint.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_orders(&self, rows: Vec<OrderRow>) -> RepositoryResult<Vec<Order>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT id, order_id, product_name, quantity, unit_price
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            items_by_order
                .entry(row.order_id)
                .or_default()
                .push(row.into_domain());
        }

        rows.into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                row.into_domain(items)
            })
            .collect()
    }

    async fn fetch_one(&self, row: Option<OrderRow>) -> RepositoryResult<Option<Order>> {
        match row {
            Some(row) => Ok(self.fetch_orders(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn exists(&self, external_id: &str) -> RepositoryResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM orders WHERE external_id = $1)",
        )
        .bind(external_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert(&self, order: &Order) -> RepositoryResult<()> {
        let mut transaction = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, external_id, total_amount, tax_amount, status, created_at, processed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id())
        .bind(order.external_id())
        .bind(order.total_amount())
        .bind(order.tax_amount().cloned())
        .bind(order.status().as_str())
        .bind(order.created_at())
        .bind(order.processed_at())
        .execute(&mut *transaction)
        .await?;

        for (position, item) in order.items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, position, product_name, quantity, unit_price
                ) VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(item.id())
            .bind(order.id())
            .bind(position as i32)
            .bind(item.product_name())
            .bind(item.quantity())
            .bind(item.unit_price())
            .execute(&mut *transaction)
            .await?;
        }

        transaction.commit().await?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        self.fetch_one(row).await
    }

    async fn get_by_external_id(&self, external_id: &str) -> RepositoryResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE external_id = $1",
            ORDER_COLUMNS
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        self.fetch_one(row).await
    }

    async fn list_all(&self) -> RepositoryResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders ORDER BY created_at, id",
            ORDER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        self.fetch_orders(rows).await
    }

    async fn list_processed(&self) -> RepositoryResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE status = $1 ORDER BY created_at, id",
            ORDER_COLUMNS
        ))
        .bind(OrderStatus::Processed.as_str())
        .fetch_all(&self.pool)
        .await?;

        self.fetch_orders(rows).await
    }

    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

/// Internal row types for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    external_id: String,
    total_amount: BigDecimal,
    tax_amount: Option<BigDecimal>,
    status: String,
    created_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    fn into_domain(self, items: Vec<OrderItem>) -> RepositoryResult<Order> {
        let status = self
            .status
            .parse::<OrderStatus>()
            .map_err(|e| RepositoryError::Corrupt {
                id: self.id,
                reason: e.to_string(),
            })?;

        Ok(Order::restore(OrderRecord {
            id: self.id,
            external_id: self.external_id,
            items,
            total_amount: self.total_amount,
            tax_amount: self.tax_amount,
            status,
            created_at: self.created_at,
            processed_at: self.processed_at,
        }))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_name: String,
    quantity: i32,
    unit_price: BigDecimal,
}

impl OrderItemRow {
    fn into_domain(self) -> OrderItem {
        OrderItem::restore(self.id, self.product_name, self.quantity, self.unit_price)
    }
}
