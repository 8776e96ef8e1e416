use tracing::debug;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::records::{Debt, Payment};
use crate::types::PaymentApplication;

use super::{OverpaymentPolicy, PaymentRequest};

/// outcome of spreading one incoming payment over a client's debts
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// one entry per debt touched, oldest debt first
    pub applications: Vec<PaymentApplication>,
    pub outstanding_before: Money,
    /// part of the request not applied to any debt
    pub unapplied: Money,
}

impl Allocation {
    pub fn total_applied(&self) -> Money {
        self.applications.iter().map(|a| a.applied).sum()
    }

    pub fn outstanding_after(&self) -> Money {
        self.outstanding_before - self.total_applied()
    }
}

/// FIFO payment allocator: the oldest open debt is settled first
pub struct PaymentAllocator {
    policy: OverpaymentPolicy,
}

impl PaymentAllocator {
    pub fn new(policy: OverpaymentPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> OverpaymentPolicy {
        self.policy
    }

    /// Allocate `request` over `debts`.
    ///
    /// Debts without a positive balance are skipped; the rest are visited in
    /// creation order (`Debt::number`). Debts are only ever appended to. The
    /// overpayment policy is checked before any debt is touched, so a
    /// rejected payment leaves every debt unchanged.
    pub fn allocate<'a, I>(
        &self,
        debts: I,
        request: &PaymentRequest,
        events: &mut EventStore,
    ) -> Result<Allocation>
    where
        I: IntoIterator<Item = &'a mut Debt>,
    {
        request.validate()?;

        let mut open: Vec<&mut Debt> = debts.into_iter().filter(|d| d.is_open()).collect();
        if open.is_empty() {
            return Err(LedgerError::NoOpenDebts {
                client_id: request.client_id.clone(),
            });
        }
        open.sort_by_key(|d| d.number);

        let outstanding_before: Money = open.iter().map(|d| d.balance()).sum();
        let unapplied = self.policy.check(request.amount, outstanding_before)?;

        let mut remaining = request.amount;
        let mut applications = Vec::new();

        for debt in open {
            if !remaining.is_positive() {
                break;
            }

            let applied = remaining.min(debt.balance());
            if !applied.is_positive() {
                continue;
            }

            let payment = Payment::new(
                applied,
                request.paid_at,
                request.method,
                request.note.clone(),
            );
            let payment_id = payment.id;
            debt.append_payment(payment);
            remaining -= applied;

            let new_balance = debt.balance();
            debug!(
                debt = debt.number,
                applied = %applied,
                new_balance = %new_balance,
                remaining = %remaining,
                "payment applied to debt"
            );

            events.emit(Event::PaymentApplied {
                debt_id: debt.id,
                payment_id,
                applied,
                new_balance,
                method: request.method,
                paid_at: request.paid_at,
            });

            applications.push(PaymentApplication {
                debt_id: debt.id,
                debt_number: debt.number,
                payment_id,
                applied,
                new_balance,
            });
        }

        debug_assert_eq!(remaining, unapplied);

        Ok(Allocation {
            applications,
            outstanding_before,
            unapplied: remaining,
        })
    }
}
