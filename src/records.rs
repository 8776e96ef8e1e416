use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::balance;
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::types::{ClientId, DebtId, DebtStatus, PaymentId, PaymentMethod};

/// client registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub full_name: String,
    pub phone: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub address: String,
}

impl Client {
    pub fn new(
        id: impl Into<String>,
        full_name: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id: ClientId::new(id),
            full_name: full_name.into(),
            phone: phone.into(),
            nickname: String::new(),
            address: String::new(),
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = nickname.into();
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// identifier, name and phone are required
    pub fn validate(&self) -> Result<()> {
        if self.id.as_str().trim().is_empty() {
            return Err(LedgerError::invalid_record("client without identifier"));
        }
        if self.full_name.trim().is_empty() {
            return Err(LedgerError::invalid_record(format!(
                "client {} has no name",
                self.id
            )));
        }
        if self.phone.trim().is_empty() {
            return Err(LedgerError::invalid_record(format!(
                "client {} has no phone",
                self.id
            )));
        }
        Ok(())
    }
}

/// a single money-in event against one debt, immutable once appended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub amount: Money,
    pub paid_at: NaiveDateTime,
    pub method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Payment {
    pub fn new(
        amount: Money,
        paid_at: NaiveDateTime,
        method: PaymentMethod,
        note: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount,
            paid_at,
            method,
            note,
        }
    }
}

/// projected schedule entry, not a payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub number: u32,
    pub amount: Money,
    pub due_date: NaiveDate,
}

/// a sale on credit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debt {
    pub id: DebtId,
    /// creation order, assigned once and never reused
    pub number: u64,
    pub client_id: ClientId,
    pub original_amount: Money,
    pub created_on: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub installments: Vec<Installment>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<NaiveDateTime>,
}

impl Debt {
    pub fn new(
        number: u64,
        client_id: ClientId,
        original_amount: Money,
        created_on: NaiveDate,
        note: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            number,
            client_id,
            original_amount,
            created_on,
            note,
            installments: Vec::new(),
            payments: Vec::new(),
            closed_at: None,
        }
    }

    /// raw arithmetic balance, may be negative
    pub fn balance(&self) -> Money {
        balance::balance(self)
    }

    /// balance clamped to zero for display
    pub fn outstanding(&self) -> Money {
        balance::outstanding(self)
    }

    pub fn total_paid(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }

    pub fn status(&self) -> DebtStatus {
        if self.balance().is_positive() {
            DebtStatus::Open
        } else {
            DebtStatus::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.status() == DebtStatus::Open
    }

    pub fn last_payment(&self) -> Option<&Payment> {
        self.payments.last()
    }

    /// append a payment entry; history is never rewritten
    pub(crate) fn append_payment(&mut self, payment: Payment) {
        self.payments.push(payment);
    }

    /// record the closing timestamp the first time the debt is seen closed
    pub(crate) fn mark_closed(&mut self, at: NaiveDateTime) -> bool {
        if self.closed_at.is_none() && !self.is_open() {
            self.closed_at = Some(at);
            return true;
        }
        false
    }

    pub fn validate(&self) -> Result<()> {
        if self.client_id.as_str().trim().is_empty() {
            return Err(LedgerError::invalid_record(format!(
                "debt #{} has no client",
                self.number
            )));
        }
        if !self.original_amount.is_positive() {
            return Err(LedgerError::invalid_record(format!(
                "debt #{} has non-positive amount {}",
                self.number, self.original_amount
            )));
        }
        if let Some(bad) = self.payments.iter().find(|p| !p.amount.is_positive()) {
            return Err(LedgerError::invalid_record(format!(
                "debt #{} has non-positive payment {} ({})",
                self.number, bad.id, bad.amount
            )));
        }
        if self.closed_at.is_some() && self.is_open() {
            return Err(LedgerError::invalid_record(format!(
                "debt #{} is marked closed but still owes {}",
                self.number,
                self.balance()
            )));
        }
        Ok(())
    }
}

/// validate a loaded client collection
pub fn validate_clients(clients: &[Client]) -> Result<()> {
    let mut seen = HashSet::new();
    for client in clients {
        client.validate()?;
        if !seen.insert(&client.id) {
            return Err(LedgerError::invalid_record(format!(
                "duplicate client identifier {}",
                client.id
            )));
        }
    }
    Ok(())
}

/// validate a loaded debt collection
pub fn validate_debts(debts: &[Debt]) -> Result<()> {
    let mut numbers = HashSet::new();
    let mut ids = HashSet::new();
    for debt in debts {
        debt.validate()?;
        if !numbers.insert(debt.number) {
            return Err(LedgerError::invalid_record(format!(
                "duplicate debt number {}",
                debt.number
            )));
        }
        if !ids.insert(debt.id) {
            return Err(LedgerError::invalid_record(format!(
                "duplicate debt id {}",
                debt.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        day(y, m, d).and_hms_opt(10, 0, 0).unwrap()
    }

    #[test]
    fn test_client_validation() {
        assert!(Client::new("111", "Ana Souza", "9999-0000").validate().is_ok());
        assert!(Client::new("", "Ana Souza", "9999-0000").validate().is_err());
        assert!(Client::new("111", " ", "9999-0000").validate().is_err());
        assert!(Client::new("111", "Ana Souza", "").validate().is_err());
    }

    #[test]
    fn test_duplicate_clients_rejected() {
        let clients = vec![
            Client::new("111", "Ana", "1"),
            Client::new("111", "Ana again", "2"),
        ];
        assert!(matches!(
            validate_clients(&clients),
            Err(LedgerError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn test_debt_status_follows_balance() {
        let mut debt = Debt::new(1, ClientId::new("111"), Money::from_major(50), day(2024, 1, 1), None);
        assert_eq!(debt.status(), DebtStatus::Open);
        assert!(!debt.mark_closed(at(2024, 1, 2)));

        debt.append_payment(Payment::new(Money::from_major(50), at(2024, 1, 2), PaymentMethod::Cash, None));
        assert_eq!(debt.status(), DebtStatus::Closed);
        assert!(debt.mark_closed(at(2024, 1, 2)));
        // only once
        assert!(!debt.mark_closed(at(2024, 1, 3)));
        assert_eq!(debt.closed_at, Some(at(2024, 1, 2)));
    }

    #[test]
    fn test_debt_validation() {
        let mut debt = Debt::new(1, ClientId::new("111"), Money::from_major(50), day(2024, 1, 1), None);
        assert!(debt.validate().is_ok());

        debt.closed_at = Some(at(2024, 1, 1));
        assert!(debt.validate().is_err());
        debt.closed_at = None;

        debt.payments.push(Payment::new(Money::ZERO, at(2024, 1, 2), PaymentMethod::Cash, None));
        assert!(debt.validate().is_err());

        let zero = Debt::new(2, ClientId::new("111"), Money::ZERO, day(2024, 1, 1), None);
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_missing_required_field_fails_decode() {
        let json = r#"{"id": "111", "full_name": "Ana"}"#;
        assert!(serde_json::from_str::<Client>(json).is_err());

        let json = r#"{"id": "111", "full_name": "Ana", "phone": "1"}"#;
        let client: Client = serde_json::from_str(json).unwrap();
        assert_eq!(client.nickname, "");
    }
}
