use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};

/// what to do with the part of a payment that exceeds everything owed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverpaymentPolicy {
    /// refuse the whole payment, nothing is applied
    #[default]
    Reject,
    /// apply what is owed and hand the excess back as change
    ReturnChange,
}

impl OverpaymentPolicy {
    /// Check a payment against the total outstanding before anything is applied.
    ///
    /// Returns the amount that will be left unapplied.
    pub fn check(&self, requested: Money, outstanding: Money) -> Result<Money> {
        let excess = (requested - outstanding).clamp_non_negative();
        if excess.is_zero() {
            return Ok(Money::ZERO);
        }
        match self {
            OverpaymentPolicy::Reject => Err(LedgerError::OverpaymentRejected {
                requested,
                outstanding,
            }),
            OverpaymentPolicy::ReturnChange => Ok(excess),
        }
    }
}
