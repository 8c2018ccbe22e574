//! Business errors returned by the order workflow.
//! Codes follow the `<Entity>.<Kind>` convention so the HTTP layer can map them by suffix.

use std::fmt;
use uuid::Uuid;

pub const ORDER_ENTITY: &str = "Order";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Duplicate,
    Validation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Duplicate => "Duplicate",
            ErrorKind::Validation => "Validation",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed business failure with a dotted code and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct DomainError {
    code: String,
    message: String,
}

impl DomainError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(entity: &str, identifier: impl fmt::Display) -> Self {
        Self::new(
            format!("{}.{}", entity, ErrorKind::NotFound),
            format!("{} with identifier '{}' was not found.", entity, identifier),
        )
    }

    pub fn duplicate(entity: &str, identifier: impl fmt::Display) -> Self {
        Self::new(
            format!("{}.{}", entity, ErrorKind::Duplicate),
            format!("{} with identifier '{}' already exists.", entity, identifier),
        )
    }

    pub fn validation(entity: &str, message: impl Into<String>) -> Self {
        Self::new(format!("{}.{}", entity, ErrorKind::Validation), message)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Kind derived from the code suffix. Unknown suffixes are treated as validation failures.
    pub fn kind(&self) -> ErrorKind {
        if self.code.ends_with(".NotFound") {
            ErrorKind::NotFound
        } else if self.code.ends_with(".Duplicate") {
            ErrorKind::Duplicate
        } else {
            ErrorKind::Validation
        }
    }
}

/// Constructors for the errors the order workflow produces.
pub mod order_errors {
    use super::*;

    pub fn not_found(id: Uuid) -> DomainError {
        DomainError::not_found(ORDER_ENTITY, id)
    }

    pub fn not_found_by_external_id(external_id: &str) -> DomainError {
        DomainError::not_found(ORDER_ENTITY, external_id)
    }

    pub fn duplicate(external_id: &str) -> DomainError {
        DomainError::duplicate(ORDER_ENTITY, external_id)
    }

    pub fn validation(message: impl Into<String>) -> DomainError {
        DomainError::validation(ORDER_ENTITY, message)
    }
}
