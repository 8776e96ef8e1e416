use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::receipt::ReceiptKind;
use crate::types::{ClientId, DebtId, PaymentId, PaymentMethod};

/// all events that can be emitted by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // debt lifecycle
    DebtRegistered {
        debt_id: DebtId,
        number: u64,
        client_id: ClientId,
        amount: Money,
        created_on: NaiveDate,
    },
    InstallmentPlanCreated {
        debt_id: DebtId,
        count: u32,
        per_installment: Money,
        rounding_drift: Money,
    },
    DebtClosed {
        debt_id: DebtId,
        number: u64,
        closed_at: NaiveDateTime,
    },

    // payment events
    PaymentApplied {
        debt_id: DebtId,
        payment_id: PaymentId,
        applied: Money,
        new_balance: Money,
        method: PaymentMethod,
        paid_at: NaiveDateTime,
    },
    OverpaymentReturned {
        client_id: ClientId,
        requested: Money,
        returned: Money,
    },

    // audit artifacts
    ReceiptIssued {
        debt_id: DebtId,
        kind: ReceiptKind,
        receipt_id: String,
        issued_at: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
