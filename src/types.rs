use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::LedgerError;

/// unique identifier for a debt
pub type DebtId = Uuid;

/// unique identifier for a payment entry
pub type PaymentId = Uuid;

/// natural-person identifier of a client (CPF or equivalent tax id)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        ClientId(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        ClientId::new(s)
    }
}

/// how a payment was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    /// PIX and other instant transfers
    InstantTransfer,
    Cash,
    DebitCard,
    CreditCard,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::InstantTransfer,
        PaymentMethod::Cash,
        PaymentMethod::DebitCard,
        PaymentMethod::CreditCard,
    ];

    /// label printed on receipts
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::InstantTransfer => "PIX",
            PaymentMethod::Cash => "CASH",
            PaymentMethod::DebitCard => "DEBIT CARD",
            PaymentMethod::CreditCard => "CREDIT CARD",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentMethod {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();

        match normalized.as_str() {
            "pix" | "instant-transfer" | "transfer" => Ok(PaymentMethod::InstantTransfer),
            "cash" | "dinheiro" => Ok(PaymentMethod::Cash),
            "debit-card" | "debit" | "debito" | "débito" | "cartao-de-debito" => {
                Ok(PaymentMethod::DebitCard)
            }
            "credit-card" | "credit" | "credito" | "crédito" | "cartao-de-credito" => {
                Ok(PaymentMethod::CreditCard)
            }
            _ => Err(LedgerError::InvalidPaymentMethod {
                input: s.to_string(),
            }),
        }
    }
}

/// debt lifecycle state, derived from the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebtStatus {
    /// balance above zero
    Open,
    /// balance at or below zero, terminal
    Closed,
}

/// result of applying part of an incoming payment to one debt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentApplication {
    pub debt_id: DebtId,
    pub debt_number: u64,
    pub payment_id: PaymentId,
    pub applied: Money,
    pub new_balance: Money,
}

impl PaymentApplication {
    pub fn closes_debt(&self) -> bool {
        !self.new_balance.is_positive()
    }
}
