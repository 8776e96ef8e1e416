use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::records::Installment;

/// installment schedule for a structured-plan debt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentPlan {
    pub total: Money,
    pub count: u32,
    pub start: NaiveDate,
    pub per_installment: Money,
    pub installments: Vec<Installment>,
}

impl InstallmentPlan {
    /// generate the schedule
    ///
    /// Every installment is `round(total / count)`; the rounding remainder
    /// is left where it falls, see [`InstallmentPlan::rounding_drift`].
    pub fn generate(total: Money, count: u32, start: NaiveDate) -> Result<Self> {
        if !total.is_positive() {
            return Err(LedgerError::InvalidPlan {
                message: format!("total must be positive, got {}", total),
            });
        }
        let per_installment = total.split(count).ok_or_else(|| LedgerError::InvalidPlan {
            message: "installment count must be at least 1".to_string(),
        })?;

        // the last due date bounds the schedule before anything is allocated
        add_months(start, count - 1)?;

        let mut installments = Vec::with_capacity(count as usize);
        for number in 1..=count {
            installments.push(Installment {
                number,
                amount: per_installment,
                due_date: add_months(start, number - 1)?,
            });
        }

        Ok(Self {
            total,
            count,
            start,
            per_installment,
            installments,
        })
    }

    pub fn scheduled_total(&self) -> Money {
        self.installments.iter().map(|i| i.amount).sum()
    }

    /// `total - Σ installments`; bounded by `count × 0.005`
    pub fn rounding_drift(&self) -> Money {
        self.total - self.scheduled_total()
    }

    pub fn max_drift(&self) -> Decimal {
        dec!(0.005) * Decimal::from(self.count)
    }

    pub fn get(&self, number: u32) -> Option<&Installment> {
        number
            .checked_sub(1)
            .and_then(|i| self.installments.get(i as usize))
    }

    /// first installment due strictly after `date`
    pub fn next_due_after(&self, date: NaiveDate) -> Option<&Installment> {
        self.installments.iter().find(|i| i.due_date > date)
    }

    pub fn into_installments(self) -> Vec<Installment> {
        self.installments
    }
}

/// calendar month arithmetic, clamping to the last day of the target month
fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| LedgerError::InvalidPlan {
            message: format!("due date out of range: {} + {} months", date, months),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_even_plan() {
        let plan = InstallmentPlan::generate(Money::from_major(300), 3, day(2024, 1, 10)).unwrap();

        let expected = vec![
            (1, day(2024, 1, 10)),
            (2, day(2024, 2, 10)),
            (3, day(2024, 3, 10)),
        ];
        assert_eq!(plan.installments.len(), 3);
        for (installment, (number, due)) in plan.installments.iter().zip(expected) {
            assert_eq!(installment.number, number);
            assert_eq!(installment.due_date, due);
            assert_eq!(installment.amount, Money::from_major(100));
        }
        assert_eq!(plan.rounding_drift(), Money::ZERO);
    }

    #[test]
    fn test_month_end_clamping() {
        let plan = InstallmentPlan::generate(Money::from_major(400), 4, day(2024, 1, 31)).unwrap();
        let dues: Vec<_> = plan.installments.iter().map(|i| i.due_date).collect();
        assert_eq!(
            dues,
            vec![day(2024, 1, 31), day(2024, 2, 29), day(2024, 3, 31), day(2024, 4, 30)]
        );

        let plan = InstallmentPlan::generate(Money::from_major(200), 2, day(2023, 1, 31)).unwrap();
        assert_eq!(plan.installments[1].due_date, day(2023, 2, 28));
    }

    #[test]
    fn test_rounding_drift_is_not_redistributed() {
        let plan = InstallmentPlan::generate(Money::from_major(100), 3, day(2024, 1, 1)).unwrap();
        for installment in &plan.installments {
            assert_eq!(installment.amount, Money::from_minor(3333));
        }
        assert_eq!(plan.scheduled_total(), Money::from_minor(9999));
        assert_eq!(plan.rounding_drift(), Money::CENT);
        assert!(plan.rounding_drift().as_decimal().abs() <= plan.max_drift());
    }

    #[test]
    fn test_invalid_plans() {
        assert!(matches!(
            InstallmentPlan::generate(Money::from_major(100), 0, day(2024, 1, 1)),
            Err(LedgerError::InvalidPlan { .. })
        ));
        assert!(matches!(
            InstallmentPlan::generate(Money::ZERO, 3, day(2024, 1, 1)),
            Err(LedgerError::InvalidPlan { .. })
        ));
        assert!(matches!(
            InstallmentPlan::generate(Money::from_major(-5), 3, day(2024, 1, 1)),
            Err(LedgerError::InvalidPlan { .. })
        ));
    }

    #[test]
    fn test_count_beyond_calendar_range() {
        let result = InstallmentPlan::generate(Money::from_major(100), u32::MAX, day(2024, 1, 1));
        match result {
            Err(LedgerError::InvalidPlan { message }) => assert!(message.contains("out of range")),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_lookup_helpers() {
        let plan = InstallmentPlan::generate(Money::from_major(300), 3, day(2024, 1, 10)).unwrap();
        assert_eq!(plan.get(0), None);
        assert_eq!(plan.get(2).map(|i| i.due_date), Some(day(2024, 2, 10)));
        assert_eq!(plan.get(4), None);
        assert_eq!(plan.next_due_after(day(2024, 2, 10)).map(|i| i.number), Some(3));
        assert_eq!(plan.next_due_after(day(2024, 3, 10)), None);
    }
}
