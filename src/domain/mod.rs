//! Framework-agnostic order domain: the aggregate, its errors, and tax policies.

pub mod error;
pub mod order;
pub mod tax;

pub use error::{DomainError, ErrorKind};
pub use order::{Order, OrderError, OrderItem, OrderStatus};
pub use tax::TaxPolicy;
