pub mod feature_flags;
pub mod order_service;
pub mod tax_policy;

pub use feature_flags::{EnvFeatureFlags, PostgresFeatureFlags, StaticFeatureFlags};
pub use order_service::{CreateOrderInput, NewOrderItem, OrderService, OrderServiceError};
pub use tax_policy::TaxPolicySelector;
