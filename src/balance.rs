//! Balance arithmetic. Balances are never stored; they are recomputed from
//! the original amount and the payment history on every call.

use crate::decimal::Money;
use crate::records::Debt;
use crate::types::ClientId;

/// original amount minus every payment, may go negative
pub fn balance(debt: &Debt) -> Money {
    debt.payments
        .iter()
        .fold(debt.original_amount, |acc, p| acc - p.amount)
}

/// balance clamped to zero
pub fn outstanding(debt: &Debt) -> Money {
    balance(debt).clamp_non_negative()
}

/// sum of clamped balances over one client's debts
pub fn client_outstanding<'a, I>(debts: I, client_id: &ClientId) -> Money
where
    I: IntoIterator<Item = &'a Debt>,
{
    debts
        .into_iter()
        .filter(|d| &d.client_id == client_id)
        .map(outstanding)
        .sum()
}

/// amount paid beyond the original, if any
pub fn overpaid(debt: &Debt) -> Money {
    (Money::ZERO - balance(debt)).clamp_non_negative()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Payment;
    use crate::types::PaymentMethod;
    use chrono::NaiveDate;

    fn debt_with(client: &str, number: u64, original: i64, payments: &[i64]) -> Debt {
        let created = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let mut debt = Debt::new(number, ClientId::new(client), Money::from_minor(original), created, None);
        for cents in payments {
            debt.payments.push(Payment::new(
                Money::from_minor(*cents),
                created.and_hms_opt(12, 0, 0).unwrap(),
                PaymentMethod::Cash,
                None,
            ));
        }
        debt
    }

    #[test]
    fn test_balance_is_original_minus_payments() {
        let debt = debt_with("111", 1, 30_000, &[10_000, 2_550]);
        assert_eq!(balance(&debt), Money::from_minor(17_450));
        assert_eq!(debt.total_paid(), Money::from_minor(12_550));
    }

    #[test]
    fn test_balance_independent_of_order() {
        let a = debt_with("111", 1, 10_000, &[1_000, 2_345, 333]);
        let b = debt_with("111", 1, 10_000, &[333, 1_000, 2_345]);
        assert_eq!(balance(&a), balance(&b));
    }

    #[test]
    fn test_negative_balance_is_clamped_for_display() {
        let debt = debt_with("111", 1, 4_000, &[5_000]);
        assert_eq!(balance(&debt), Money::from_minor(-1_000));
        assert_eq!(outstanding(&debt), Money::ZERO);
        assert_eq!(overpaid(&debt), Money::from_minor(1_000));
    }

    #[test]
    fn test_client_outstanding_filters_by_client() {
        let debts = vec![
            debt_with("111", 1, 5_000, &[]),
            debt_with("222", 2, 9_900, &[]),
            debt_with("111", 3, 8_000, &[1_000]),
            debt_with("111", 4, 1_000, &[2_000]),
        ];
        assert_eq!(client_outstanding(&debts, &ClientId::new("111")), Money::from_minor(12_000));
        assert_eq!(client_outstanding(&debts, &ClientId::new("333")), Money::ZERO);
    }
}
