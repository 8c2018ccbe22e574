//! In-memory implementation of OrderRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{Order, OrderStatus};
use crate::ports::{OrderRepository, RepositoryError, RepositoryResult};

#[derive(Default)]
struct Inner {
    orders: HashMap<Uuid, Order>,
    by_external_id: HashMap<String, Uuid>,
    // Insertion order, for listing.
    sequence: Vec<Uuid>,
}

/// Process-local order store. Uniqueness is checked and the order inserted under
/// a single write lock.
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn exists(&self, external_id: &str) -> RepositoryResult<bool> {
        Ok(self.inner.read().await.by_external_id.contains_key(external_id))
    }

    async fn insert(&self, order: &Order) -> RepositoryResult<()> {
        let mut inner = self.inner.write().await;

        if inner.by_external_id.contains_key(order.external_id()) {
            return Err(RepositoryError::Conflict(order.external_id().to_string()));
        }

        inner
            .by_external_id
            .insert(order.external_id().to_string(), order.id());
        inner.sequence.push(order.id());
        inner.orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Order>> {
        Ok(self.inner.read().await.orders.get(&id).cloned())
    }

    async fn get_by_external_id(&self, external_id: &str) -> RepositoryResult<Option<Order>> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_external_id
            .get(external_id)
            .and_then(|id| inner.orders.get(id))
            .cloned())
    }

    async fn list_all(&self) -> RepositoryResult<Vec<Order>> {
        let inner = self.inner.read().await;
        Ok(inner
            .sequence
            .iter()
            .filter_map(|id| inner.orders.get(id))
            .cloned()
            .collect())
    }

    async fn list_processed(&self) -> RepositoryResult<Vec<Order>> {
        let inner = self.inner.read().await;
        Ok(inner
            .sequence
            .iter()
            .filter_map(|id| inner.orders.get(id))
            .filter(|order| order.status() == OrderStatus::Processed)
            .cloned()
            .collect())
    }

    fn backend(&self) -> &'static str {
        "in-memory"
    }
}
