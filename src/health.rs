use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use utoipa::ToSchema;

use crate::ports::OrderRepository;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub dependencies: HashMap<String, DependencyStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DependencyStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DependencyStatus {
    pub fn healthy(latency_ms: u64) -> Self {
        Self {
            status: "healthy".to_string(),
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: "unhealthy".to_string(),
            latency_ms: None,
            error: Some(error.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.error.is_none()
    }
}

#[async_trait]
pub trait DependencyChecker: Send + Sync {
    fn name(&self) -> String;

    async fn check(&self) -> DependencyStatus;
}

/// Checks that the configured order store answers.
pub struct OrderStoreChecker {
    repository: Arc<dyn OrderRepository>,
}

impl OrderStoreChecker {
    pub fn new(repository: Arc<dyn OrderRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl DependencyChecker for OrderStoreChecker {
    fn name(&self) -> String {
        format!("order_store:{}", self.repository.backend())
    }

    async fn check(&self) -> DependencyStatus {
        let start = Instant::now();
        match self.repository.ping().await {
            Ok(()) => DependencyStatus::healthy(start.elapsed().as_millis() as u64),
            Err(e) => {
                tracing::error!(
                    backend = self.repository.backend(),
                    error = %e,
                    "Order store health check failed"
                );
                DependencyStatus::unhealthy("unavailable")
            }
        }
    }
}

pub async fn check_health(
    checkers: &[Box<dyn DependencyChecker>],
    start_time: Instant,
) -> HealthResponse {
    let results = futures::future::join_all(checkers.iter().map(|checker| async move {
        let status = timeout(CHECK_TIMEOUT, checker.check())
            .await
            .unwrap_or_else(|_| DependencyStatus::unhealthy("timeout"));
        (checker.name(), status)
    }))
    .await;

    let dependencies: HashMap<String, DependencyStatus> = results.into_iter().collect();
    let status = if dependencies.values().all(DependencyStatus::is_healthy) {
        "healthy"
    } else {
        "unhealthy"
    };

    HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.elapsed().as_secs(),
        dependencies,
    }
}
