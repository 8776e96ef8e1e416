pub mod sink;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::balance;
use crate::config::ReceiptConfig;
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::records::{Client, Debt, Payment};
use crate::types::DebtId;

pub use sink::{DirectoryReceiptSink, MemoryReceiptSink, ReceiptSink};

const RULE_WIDTH: usize = 48;
const ISSUED_FORMAT: &str = "%d/%m/%Y %H:%M:%S";
const PAYMENT_FORMAT: &str = "%d/%m/%Y %H:%M";
const DATE_FORMAT: &str = "%d/%m/%Y";
const ID_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// receipt kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReceiptKind {
    DebtOpened,
    PaymentApplied,
}

impl ReceiptKind {
    pub fn slug(&self) -> &'static str {
        match self {
            ReceiptKind::DebtOpened => "debt-opened",
            ReceiptKind::PaymentApplied => "payment-applied",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ReceiptKind::DebtOpened => "DEBT OPENED",
            ReceiptKind::PaymentApplied => "PAYMENT",
        }
    }
}

/// what the receipt is proof of
#[derive(Debug, Clone, Copy)]
pub enum ReceiptEvent<'a> {
    DebtOpened,
    PaymentApplied {
        payment: &'a Payment,
        /// client-wide outstanding balance right after this payment
        client_running_balance: Option<Money>,
    },
}

impl ReceiptEvent<'_> {
    pub fn kind(&self) -> ReceiptKind {
        match self {
            ReceiptEvent::DebtOpened => ReceiptKind::DebtOpened,
            ReceiptEvent::PaymentApplied { .. } => ReceiptKind::PaymentApplied,
        }
    }
}

/// rendered, immutable receipt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub id: String,
    pub kind: ReceiptKind,
    pub debt_id: DebtId,
    pub issued_at: DateTime<Utc>,
    pub body: String,
}

/// where a written receipt ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptHandle {
    pub id: String,
    pub kind: ReceiptKind,
    pub location: Option<PathBuf>,
}

/// renders receipts and hands them to a sink
#[derive(Debug, Clone)]
pub struct ReceiptGenerator {
    config: ReceiptConfig,
}

impl ReceiptGenerator {
    pub fn new(config: ReceiptConfig) -> Self {
        Self { config }
    }

    /// render and write in one step
    pub fn emit(
        &self,
        sink: &mut dyn ReceiptSink,
        client: &Client,
        debt: &Debt,
        event: ReceiptEvent<'_>,
        issued_at: DateTime<Utc>,
    ) -> Result<ReceiptHandle> {
        let receipt = self.render(client, debt, event, issued_at)?;
        sink.write(&receipt)
    }

    pub fn render(
        &self,
        client: &Client,
        debt: &Debt,
        event: ReceiptEvent<'_>,
        issued_at: DateTime<Utc>,
    ) -> Result<Receipt> {
        let kind = event.kind();
        let rule = "-".repeat(RULE_WIDTH);
        let double_rule = "=".repeat(RULE_WIDTH);
        let mut lines = vec![
            double_rule.clone(),
            format!("{} - {}", self.config.header, kind.title()),
            format!("Issued at: {}", issued_at.format(ISSUED_FORMAT)),
            format!("Debt: #{} ({})", debt.number, debt.id),
            rule.clone(),
            format!("Client: {}", client.full_name),
            format!("Client ID: {}", client.id),
            rule.clone(),
            format!("Created on: {}", debt.created_on.format(DATE_FORMAT)),
            format!("Original amount: {}", debt.original_amount.format_brl()),
        ];
        if let Some(note) = &debt.note {
            lines.push(format!("Note: {}", note));
        }
        lines.push(rule);

        match event {
            ReceiptEvent::DebtOpened => {
                lines.push("STATUS: DEBT FULLY OPEN".to_string());
                if !debt.installments.is_empty() {
                    let count = debt.installments.len();
                    lines.push(format!("Installments: {}", count));
                    lines.extend(debt.installments.iter().map(|installment| {
                        format!(
                            "  {}/{}  {}  due {}",
                            installment.number,
                            count,
                            installment.amount.format_brl(),
                            installment.due_date.format(DATE_FORMAT)
                        )
                    }));
                }
            }
            ReceiptEvent::PaymentApplied {
                payment,
                client_running_balance,
            } => {
                let debt_balance = balance_after(debt, payment)?;
                let outstanding = client_running_balance.unwrap_or(debt_balance);
                lines.push(format!("Amount paid: {}", payment.amount.format_brl()));
                lines.push(format!("Payment date: {}", payment.paid_at.format(PAYMENT_FORMAT)));
                lines.push(format!("Method: {}", payment.method));
                if let Some(note) = &payment.note {
                    lines.push(format!("Payment note: {}", note));
                }
                lines.push(format!("Debt balance: {}", debt_balance.format_brl()));
                lines.push(format!("OUTSTANDING BALANCE: {}", outstanding.format_brl()));
            }
        }
        lines.push(double_rule);

        let mut body = lines.join("\n");
        body.push('\n');

        Ok(Receipt {
            id: self.receipt_id(kind, debt, client, issued_at),
            kind,
            debt_id: debt.id,
            issued_at,
            body,
        })
    }

    /// `<kind>_<debt number>_<client slug>_<timestamp>`
    pub fn receipt_id(
        &self,
        kind: ReceiptKind,
        debt: &Debt,
        client: &Client,
        issued_at: DateTime<Utc>,
    ) -> String {
        format!(
            "{}_{:05}_{}_{}",
            kind.slug(),
            debt.number,
            slugify(&client.full_name, self.config.client_name_max_len),
            issued_at.format(ID_TIMESTAMP_FORMAT)
        )
    }
}

/// clamped debt balance right after `payment` was appended
fn balance_after(debt: &Debt, payment: &Payment) -> Result<Money> {
    let position = debt
        .payments
        .iter()
        .position(|p| p.id == payment.id)
        .ok_or_else(|| {
            LedgerError::invalid_record(format!(
                "payment {} does not belong to debt #{}",
                payment.id, debt.number
            ))
        })?;
    let mut prefix = debt.clone();
    prefix.payments.truncate(position + 1);
    Ok(balance::outstanding(&prefix))
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

/// lowercase ascii slug, at most `max_len` characters
fn slugify(name: &str, max_len: usize) -> String {
    let mut slug = String::new();
    let mut last_dash = false;
    for ch in name.trim().to_lowercase().chars().map(fold_accent) {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_dash = false;
        } else if !slug.is_empty() && !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let truncated: String = slug.chars().take(max_len).collect();
    let trimmed = truncated.trim_matches('-');
    if trimmed.is_empty() {
        "client".to_string()
    } else {
        trimmed.to_string()
    }
}
