use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::ports::FeatureFlagSource;

pub const REFORM_TAX_FLAG: &str = "use_new_tax_calculation";
pub const REFORM_TAX_ENV_VAR: &str = "USE_NEW_TAX_CALCULATION";

pub(crate) fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Reads the flag from the process environment on every call.
#[derive(Clone, Debug)]
pub struct EnvFeatureFlags {
    var: String,
}

impl EnvFeatureFlags {
    pub fn new() -> Self {
        Self::with_var(REFORM_TAX_ENV_VAR)
    }

    pub fn with_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvFeatureFlags {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeatureFlagSource for EnvFeatureFlags {
    async fn is_reform_tax_enabled(&self) -> bool {
        std::env::var(&self.var)
            .map(|raw| parse_flag(&raw))
            .unwrap_or(false)
    }
}

/// Reads the flag from the `feature_flags` table on every call.
/// A missing row or a database failure resolves to `false`.
#[derive(Clone)]
pub struct PostgresFeatureFlags {
    pool: PgPool,
}

impl PostgresFeatureFlags {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeatureFlagSource for PostgresFeatureFlags {
    async fn is_reform_tax_enabled(&self) -> bool {
        let enabled = sqlx::query_scalar::<_, bool>(
            "SELECT enabled FROM feature_flags WHERE name = $1",
        )
        .bind(REFORM_TAX_FLAG)
        .fetch_optional(&self.pool)
        .await;

        match enabled {
            Ok(Some(enabled)) => enabled,
            Ok(None) => {
                tracing::warn!(flag = REFORM_TAX_FLAG, "Feature flag not found, defaulting to disabled");
                false
            }
            Err(e) => {
                tracing::warn!(flag = REFORM_TAX_FLAG, error = %e, "Failed to read feature flag, defaulting to disabled");
                false
            }
        }
    }
}

/// In-process switch. Clones share the same flag.
#[derive(Clone, Debug, Default)]
pub struct StaticFeatureFlags {
    reform_tax: Arc<AtomicBool>,
}

impl StaticFeatureFlags {
    pub fn new(reform_tax: bool) -> Self {
        Self {
            reform_tax: Arc::new(AtomicBool::new(reform_tax)),
        }
    }

    pub fn set_reform_tax(&self, enabled: bool) {
        self.reform_tax.store(enabled, Ordering::SeqCst);
        tracing::info!(flag = REFORM_TAX_FLAG, enabled, "Feature flag updated");
    }
}

#[async_trait]
impl FeatureFlagSource for StaticFeatureFlags {
    async fn is_reform_tax_enabled(&self) -> bool {
        self.reform_tax.load(Ordering::SeqCst)
    }
}
