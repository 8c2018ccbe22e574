//! Ports the order workflow depends on.
//! Adapters live in `crate::adapters` and `crate::services::feature_flags`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Order;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Another order already holds this external identifier.
    #[error("Conflict on external identifier: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Corrupt stored order {id}: {reason}")]
    Corrupt { id: Uuid, reason: String },
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        let conflict = err
            .as_database_error()
            .filter(|db| db.is_unique_violation())
            .map(|db| db.constraint().unwrap_or("unique").to_string());

        match conflict {
            Some(constraint) => RepositoryError::Conflict(constraint),
            None => RepositoryError::Database(err),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Order persistence keyed by internal id and external id.
///
/// `insert` must be atomic with respect to external-id uniqueness: of any number of
/// concurrent inserts sharing an external id, exactly one succeeds and the rest
/// return [`RepositoryError::Conflict`].
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn exists(&self, external_id: &str) -> RepositoryResult<bool>;

    async fn insert(&self, order: &Order) -> RepositoryResult<()>;

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Order>>;

    async fn get_by_external_id(&self, external_id: &str) -> RepositoryResult<Option<Order>>;

    async fn list_all(&self) -> RepositoryResult<Vec<Order>>;

    async fn list_processed(&self) -> RepositoryResult<Vec<Order>>;

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str;
}

/// Source of the boolean that selects the reform tax policy.
/// Implementations read through to their backing configuration on every call.
#[async_trait]
pub trait FeatureFlagSource: Send + Sync {
    async fn is_reform_tax_enabled(&self) -> bool;
}
