use std::sync::Arc;

use crate::domain::TaxPolicy;
use crate::ports::FeatureFlagSource;

/// Picks the tax policy for a request from the reform feature flag.
/// The flag is consulted on every call; nothing is memoized here.
#[derive(Clone)]
pub struct TaxPolicySelector {
    flags: Arc<dyn FeatureFlagSource>,
}

impl TaxPolicySelector {
    pub fn new(flags: Arc<dyn FeatureFlagSource>) -> Self {
        Self { flags }
    }

    pub async fn resolve(&self) -> TaxPolicy {
        TaxPolicy::from_reform_flag(self.flags.is_reform_tax_enabled().await)
    }
}
