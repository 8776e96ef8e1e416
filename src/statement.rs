//! serializable per-client view of the ledger
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::records::{Client, Debt, Installment};
use crate::types::{ClientId, DebtId, DebtStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientStatement {
    pub client_id: ClientId,
    pub client_name: String,
    pub debts: Vec<DebtSummary>,
    pub open_debts: usize,
    pub total_outstanding: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtSummary {
    pub id: DebtId,
    pub number: u64,
    pub created_on: NaiveDate,
    pub note: Option<String>,
    pub original_amount: Money,
    pub total_paid: Money,
    pub outstanding: Money,
    pub status: DebtStatus,
    pub payment_count: usize,
    pub last_payment_at: Option<NaiveDateTime>,
    pub closed_at: Option<NaiveDateTime>,
    pub installments: Vec<Installment>,
}

impl DebtSummary {
    pub fn from_debt(debt: &Debt) -> Self {
        DebtSummary {
            id: debt.id,
            number: debt.number,
            created_on: debt.created_on,
            note: debt.note.clone(),
            original_amount: debt.original_amount,
            total_paid: debt.total_paid(),
            outstanding: debt.outstanding(),
            status: debt.status(),
            payment_count: debt.payments.len(),
            last_payment_at: debt.last_payment().map(|p| p.paid_at),
            closed_at: debt.closed_at,
            installments: debt.installments.clone(),
        }
    }
}

impl ClientStatement {
    /// build from the full debt collection; other clients' debts are ignored
    pub fn build(client: &Client, debts: &[Debt]) -> Self {
        let mut summaries: Vec<DebtSummary> = debts
            .iter()
            .filter(|d| d.client_id == client.id)
            .map(DebtSummary::from_debt)
            .collect();
        summaries.sort_by_key(|s| s.number);

        let total_outstanding = summaries.iter().map(|s| s.outstanding).sum();
        let open_debts = summaries
            .iter()
            .filter(|s| s.status == DebtStatus::Open)
            .count();

        ClientStatement {
            client_id: client.id.clone(),
            client_name: client.full_name.clone(),
            debts: summaries,
            open_debts,
            total_outstanding,
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Payment;
    use crate::types::PaymentMethod;

    #[test]
    fn test_statement_totals() {
        let client = Client::new("111", "Ana Souza", "9999");
        let created = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let paid_at = created.and_hms_opt(10, 0, 0).unwrap();

        let mut settled = Debt::new(2, client.id.clone(), Money::from_major(50), created, None);
        settled.payments.push(Payment::new(Money::from_major(50), paid_at, PaymentMethod::Cash, None));
        let open = Debt::new(1, client.id.clone(), Money::from_major(80), created, Some("sofa".to_string()));
        let other = Debt::new(3, ClientId::new("222"), Money::from_major(999), created, None);

        let statement = ClientStatement::build(&client, &[settled, other, open]);

        assert_eq!(statement.debts.len(), 2);
        assert_eq!(statement.debts[0].number, 1);
        assert_eq!(statement.debts[1].status, DebtStatus::Closed);
        assert_eq!(statement.debts[1].last_payment_at, Some(paid_at));
        assert_eq!(statement.open_debts, 1);
        assert_eq!(statement.total_outstanding, Money::from_major(80));

        let json = statement.to_json_pretty().unwrap();
        assert!(json.contains("\"total_outstanding\": \"80.00\""));
        assert!(json.contains("\"note\": \"sofa\""));
    }
}
