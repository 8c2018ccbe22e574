//! Order workflow.
//! Duplicate check, aggregate construction, tax application, state transitions,
//! and persistence through the OrderRepository port.

use bigdecimal::BigDecimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::error::order_errors;
use crate::domain::{DomainError, Order, OrderError, OrderItem};
use crate::ports::{OrderRepository, RepositoryError};
use crate::services::tax_policy::TaxPolicySelector;

/// Input for a single order line.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

/// Input for the create-order workflow.
#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub external_id: String,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, thiserror::Error)]
pub enum OrderServiceError {
    /// Business rule violation, reported to the caller as-is.
    #[error(transparent)]
    Rejected(#[from] DomainError),

    #[error("Order store failure: {0}")]
    Repository(#[from] RepositoryError),

    /// The order could not be stored. It carries the aggregate in its `Failed` state.
    #[error("Failed to store order {}: {source}", .order.id())]
    NotPersisted {
        order: Box<Order>,
        #[source]
        source: RepositoryError,
    },

    /// The workflow drove the aggregate through an invalid transition.
    #[error("Order state violation: {0}")]
    State(#[from] OrderError),
}

pub type OrderServiceResult<T> = Result<T, OrderServiceError>;

#[derive(Clone)]
pub struct OrderService {
    repository: Arc<dyn OrderRepository>,
    tax_policies: TaxPolicySelector,
}

impl OrderService {
    pub fn new(repository: Arc<dyn OrderRepository>, tax_policies: TaxPolicySelector) -> Self {
        Self {
            repository,
            tax_policies,
        }
    }

    pub async fn create_order(&self, input: CreateOrderInput) -> OrderServiceResult<Order> {
        let CreateOrderInput { external_id, items } = input;

        if self.repository.exists(&external_id).await? {
            tracing::warn!(external_id = %external_id, "Rejected duplicate order");
            return Err(order_errors::duplicate(&external_id).into());
        }

        let items = items
            .into_iter()
            .map(|item| OrderItem::new(item.product_name, item.quantity, item.unit_price))
            .collect::<Result<Vec<_>, _>>()
            .map_err(rejected_input)?;
        let mut order = Order::create(external_id, items).map_err(rejected_input)?;

        order.mark_as_processing()?;

        let policy = self.tax_policies.resolve().await;
        let tax_amount = policy.calculate(order.total_amount());
        order.apply_tax(tax_amount)?;

        // `order` stays in Processing until the processed snapshot is stored.
        let mut processed = order.clone();
        processed.mark_as_processed()?;

        match self.repository.insert(&processed).await {
            Ok(()) => {}
            Err(RepositoryError::Conflict(_)) => {
                tracing::warn!(external_id = %order.external_id(), "Rejected duplicate order on insert");
                return Err(order_errors::duplicate(order.external_id()).into());
            }
            Err(e) => {
                order.mark_as_failed()?;
                tracing::error!(
                    order_id = %order.id(),
                    external_id = %order.external_id(),
                    status = %order.status(),
                    error = %e,
                    "Failed to persist order"
                );
                return Err(OrderServiceError::NotPersisted {
                    order: Box::new(order),
                    source: e,
                });
            }
        }
        let order = processed;

        tracing::info!(
            order_id = %order.id(),
            external_id = %order.external_id(),
            tax_policy = %policy,
            total_amount = %order.total_amount(),
            tax_amount = %order.tax_amount().map(ToString::to_string).unwrap_or_default(),
            "Order created"
        );

        Ok(order)
    }

    pub async fn get_order_by_id(&self, id: Uuid) -> OrderServiceResult<Order> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| order_errors::not_found(id).into())
    }

    pub async fn get_order_by_external_id(&self, external_id: &str) -> OrderServiceResult<Order> {
        self.repository
            .get_by_external_id(external_id)
            .await?
            .ok_or_else(|| order_errors::not_found_by_external_id(external_id).into())
    }

    pub async fn list_all_orders(&self) -> OrderServiceResult<Vec<Order>> {
        Ok(self.repository.list_all().await?)
    }

    pub async fn list_processed_orders(&self) -> OrderServiceResult<Vec<Order>> {
        Ok(self.repository.list_processed().await?)
    }

    pub fn repository(&self) -> &Arc<dyn OrderRepository> {
        &self.repository
    }
}

fn rejected_input(err: OrderError) -> OrderServiceError {
    if err.is_invalid_input() {
        OrderServiceError::Rejected(order_errors::validation(err.to_string()))
    } else {
        OrderServiceError::State(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryOrderRepository;
    use crate::domain::{ErrorKind, OrderStatus};
    use crate::ports::RepositoryResult;
    use crate::services::feature_flags::StaticFeatureFlags;
    use async_trait::async_trait;

    fn dec(value: &str) -> BigDecimal {
        value.parse().unwrap()
    }

    fn item(name: &str, quantity: i32, unit_price: &str) -> NewOrderItem {
        NewOrderItem {
            product_name: name.to_string(),
            quantity,
            unit_price: dec(unit_price),
        }
    }

    fn input(external_id: &str, items: Vec<NewOrderItem>) -> CreateOrderInput {
        CreateOrderInput {
            external_id: external_id.to_string(),
            items,
        }
    }

    fn service_with(flags: StaticFeatureFlags) -> OrderService {
        OrderService::new(
            Arc::new(InMemoryOrderRepository::new()),
            TaxPolicySelector::new(Arc::new(flags)),
        )
    }

    fn service() -> OrderService {
        service_with(StaticFeatureFlags::new(false))
    }

    fn rejected_code(err: OrderServiceError) -> String {
        match err {
            OrderServiceError::Rejected(e) => e.code().to_string(),
            other => panic!("expected business error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_order_applies_current_tax() {
        let service = service();

        let order = service
            .create_order(input(
                "PED-001",
                vec![item("Product A", 2, "50.00"), item("Product B", 1, "25.00")],
            ))
            .await
            .unwrap();

        assert_eq!(order.external_id(), "PED-001");
        assert_eq!(order.total_amount(), &dec("125.00"));
        assert_eq!(order.tax_amount(), Some(&dec("37.50")));
        assert_eq!(order.status(), OrderStatus::Processed);
        assert!(order.processed_at().unwrap() >= order.created_at());
        assert_eq!(order.items().len(), 2);
    }

    #[tokio::test]
    async fn test_create_order_with_reform_flag() {
        let service = service_with(StaticFeatureFlags::new(true));

        let order = service
            .create_order(input("PED-002", vec![item("Product B", 1, "100.00")]))
            .await
            .unwrap();

        assert_eq!(order.tax_amount(), Some(&dec("20.00")));
    }

    #[tokio::test]
    async fn test_flag_flip_applies_to_next_order() {
        let flags = StaticFeatureFlags::new(false);
        let service = service_with(flags.clone());

        let first = service
            .create_order(input("PED-A", vec![item("P", 1, "100")]))
            .await
            .unwrap();
        flags.set_reform_tax(true);
        let second = service
            .create_order(input("PED-B", vec![item("P", 1, "100")]))
            .await
            .unwrap();

        assert_eq!(first.tax_amount(), Some(&dec("30")));
        assert_eq!(second.tax_amount(), Some(&dec("20")));
    }

    #[tokio::test]
    async fn test_create_order_persists() {
        let service = service();
        let created = service
            .create_order(input("PED-003", vec![item("P", 1, "10.00")]))
            .await
            .unwrap();

        let fetched = service.get_order_by_id(created.id()).await.unwrap();
        assert_eq!(fetched, created);
        let by_external = service.get_order_by_external_id("PED-003").await.unwrap();
        assert_eq!(by_external, created);
    }

    #[tokio::test]
    async fn test_duplicate_external_id_is_rejected() {
        let service = service();
        service
            .create_order(input("PED-DUPLICATE", vec![item("P", 1, "10.00")]))
            .await
            .unwrap();

        let err = service
            .create_order(input("PED-DUPLICATE", vec![item("P", 1, "10.00")]))
            .await
            .unwrap_err();

        match err {
            OrderServiceError::Rejected(e) => {
                assert_eq!(e.code(), "Order.Duplicate");
                assert!(e.message().contains("PED-DUPLICATE"));
            }
            other => panic!("expected duplicate, got {other:?}"),
        }
        assert_eq!(service.list_all_orders().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_items_are_validation_errors() {
        let service = service();

        let err = service
            .create_order(input("PED-004", vec![item("P", 0, "10.00")]))
            .await
            .unwrap_err();
        assert_eq!(rejected_code(err), "Order.Validation");

        let err = service.create_order(input("PED-005", vec![])).await.unwrap_err();
        assert_eq!(rejected_code(err), "Order.Validation");

        assert!(service.list_all_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_order_is_not_found() {
        let service = service();
        let id = Uuid::new_v4();

        let err = service.get_order_by_id(id).await.unwrap_err();
        match err {
            OrderServiceError::Rejected(e) => {
                assert_eq!(e.kind(), ErrorKind::NotFound);
                assert!(e.message().contains(&id.to_string()));
            }
            other => panic!("expected not found, got {other:?}"),
        }

        let err = service.get_order_by_external_id("NON-EXISTING").await.unwrap_err();
        match err {
            OrderServiceError::Rejected(e) => {
                assert_eq!(e.code(), "Order.NotFound");
                assert!(e.message().contains("NON-EXISTING"));
            }
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_repeated_reads_are_identical() {
        let service = service();
        let created = service
            .create_order(input("PED-006", vec![item("P", 3, "33.33")]))
            .await
            .unwrap();

        let first = service.get_order_by_id(created.id()).await.unwrap();
        for _ in 0..5 {
            assert_eq!(service.get_order_by_id(created.id()).await.unwrap(), first);
        }
    }

    #[tokio::test]
    async fn test_list_processed_only_returns_processed() {
        let repository = Arc::new(InMemoryOrderRepository::new());
        let service = OrderService::new(
            repository.clone(),
            TaxPolicySelector::new(Arc::new(StaticFeatureFlags::new(false))),
        );
        service
            .create_order(input("PED-007", vec![item("P", 1, "1")]))
            .await
            .unwrap();

        let mut failed = Order::create("PED-FAILED", vec![OrderItem::new("P", 1, dec("1")).unwrap()]).unwrap();
        failed.mark_as_failed().unwrap();
        repository.insert(&failed).await.unwrap();

        let processed = service.list_processed_orders().await.unwrap();
        assert_eq!(processed.len(), 1);
        assert!(processed.iter().all(|o| o.status() == OrderStatus::Processed));
        assert_eq!(service.list_all_orders().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_creates_with_same_external_id() {
        let service = service();
        let attempts = 16;

        let handles: Vec<_> = (0..attempts)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .create_order(input("PED-RACE", vec![item("P", 1, "10.00")]))
                        .await
                })
            })
            .collect();

        let mut successes = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(OrderServiceError::Rejected(e)) if e.code() == "Order.Duplicate" => {
                    duplicates += 1
                }
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(duplicates, attempts - 1);
    }

    /// Store that reports the external id as free but then loses the insert race.
    struct LosingRaceRepository;

    #[async_trait]
    impl OrderRepository for LosingRaceRepository {
        async fn exists(&self, _external_id: &str) -> RepositoryResult<bool> {
            Ok(false)
        }
        async fn insert(&self, order: &Order) -> RepositoryResult<()> {
            Err(RepositoryError::Conflict(order.external_id().to_string()))
        }
        async fn get_by_id(&self, _id: Uuid) -> RepositoryResult<Option<Order>> {
            Ok(None)
        }
        async fn get_by_external_id(&self, _external_id: &str) -> RepositoryResult<Option<Order>> {
            Ok(None)
        }
        async fn list_all(&self) -> RepositoryResult<Vec<Order>> {
            Ok(Vec::new())
        }
        async fn list_processed(&self) -> RepositoryResult<Vec<Order>> {
            Ok(Vec::new())
        }
        fn backend(&self) -> &'static str {
            "losing-race"
        }
    }

    /// Store whose writes always fail with an infrastructure error.
    struct UnavailableRepository;

    #[async_trait]
    impl OrderRepository for UnavailableRepository {
        async fn exists(&self, _external_id: &str) -> RepositoryResult<bool> {
            Ok(false)
        }
        async fn insert(&self, _order: &Order) -> RepositoryResult<()> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn get_by_id(&self, _id: Uuid) -> RepositoryResult<Option<Order>> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn get_by_external_id(&self, _external_id: &str) -> RepositoryResult<Option<Order>> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn list_all(&self) -> RepositoryResult<Vec<Order>> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn list_processed(&self) -> RepositoryResult<Vec<Order>> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }
        fn backend(&self) -> &'static str {
            "unavailable"
        }
    }

    #[tokio::test]
    async fn test_insert_conflict_maps_to_duplicate() {
        let service = OrderService::new(
            Arc::new(LosingRaceRepository),
            TaxPolicySelector::new(Arc::new(StaticFeatureFlags::new(false))),
        );

        let err = service
            .create_order(input("PED-LATE", vec![item("P", 1, "10")]))
            .await
            .unwrap_err();
        assert_eq!(rejected_code(err), "Order.Duplicate");
    }

    #[tokio::test]
    async fn test_store_failure_is_infrastructure_error() {
        let service = OrderService::new(
            Arc::new(UnavailableRepository),
            TaxPolicySelector::new(Arc::new(StaticFeatureFlags::new(false))),
        );

        let err = service
            .create_order(input("PED-DOWN", vec![item("P", 1, "10")]))
            .await
            .unwrap_err();
        match err {
            OrderServiceError::NotPersisted { order, source } => {
                assert_eq!(order.status(), OrderStatus::Failed);
                assert_eq!(order.external_id(), "PED-DOWN");
                assert!(order.processed_at().is_none());
                assert!(matches!(source, RepositoryError::Database(_)));
            }
            other => panic!("expected store failure, got {other:?}"),
        }

        let err = service.list_all_orders().await.unwrap_err();
        assert!(matches!(err, OrderServiceError::Repository(_)));
    }
}
