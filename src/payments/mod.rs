pub mod allocation;
pub mod installments;
pub mod overpayment;

use chrono::NaiveDateTime;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::types::{ClientId, PaymentMethod};

pub use allocation::{Allocation, PaymentAllocator};
pub use installments::InstallmentPlan;
pub use overpayment::OverpaymentPolicy;

/// incoming payment for a client, before allocation
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub client_id: ClientId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub paid_at: NaiveDateTime,
    pub note: Option<String>,
}

impl PaymentRequest {
    pub fn new(
        client_id: ClientId,
        amount: Money,
        method: PaymentMethod,
        paid_at: NaiveDateTime,
        note: Option<String>,
    ) -> Self {
        Self {
            client_id,
            amount,
            method,
            paid_at,
            note: normalize_note(note),
        }
    }

    /// build from raw user input
    pub fn parse(
        client_id: ClientId,
        amount: &str,
        method: &str,
        paid_at: NaiveDateTime,
        note: Option<String>,
    ) -> Result<Self> {
        let amount = Money::parse_positive(amount)?;
        let method = method.parse::<PaymentMethod>()?;
        Ok(Self::new(client_id, amount, method, paid_at, note))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_positive() {
            return Err(LedgerError::InvalidAmount {
                input: self.amount.to_string(),
            });
        }
        Ok(())
    }
}

/// blank notes are dropped
pub(crate) fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}
