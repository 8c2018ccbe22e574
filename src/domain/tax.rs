//! Tax policies.
//! Each policy is a flat rate applied to the order total with exact decimal arithmetic.

use bigdecimal::BigDecimal;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxPolicy {
    /// Flat 30%.
    Current,
    /// Flat 20%, enabled by the reform feature flag.
    Reform,
}

impl TaxPolicy {
    pub fn from_reform_flag(reform_enabled: bool) -> Self {
        if reform_enabled {
            TaxPolicy::Reform
        } else {
            TaxPolicy::Current
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TaxPolicy::Current => "Current",
            TaxPolicy::Reform => "Reform",
        }
    }

    pub fn rate(&self) -> BigDecimal {
        let percent: i64 = match self {
            TaxPolicy::Current => 30,
            TaxPolicy::Reform => 20,
        };
        BigDecimal::new(percent.into(), 2)
    }

    /// Tax owed on `total_amount`. The product keeps full precision.
    pub fn calculate(&self, total_amount: &BigDecimal) -> BigDecimal {
        total_amount * &self.rate()
    }
}

impl fmt::Display for TaxPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
