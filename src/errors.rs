use std::path::PathBuf;

use thiserror::Error;

use crate::decimal::Money;
use crate::receipt::ReceiptHandle;
use crate::types::{ClientId, DebtId, PaymentApplication};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid amount: {input:?}")]
    InvalidAmount {
        input: String,
    },

    #[error("invalid installment plan: {message}")]
    InvalidPlan {
        message: String,
    },

    #[error("client {client_id} has no open debts")]
    NoOpenDebts {
        client_id: ClientId,
    },

    #[error("overpayment rejected: requested {requested}, outstanding {outstanding}")]
    OverpaymentRejected {
        requested: Money,
        outstanding: Money,
    },

    #[error("client not found: {client_id}")]
    ClientNotFound {
        client_id: ClientId,
    },

    #[error("debt not found: {debt_id}")]
    DebtNotFound {
        debt_id: DebtId,
    },

    #[error("invalid payment method: {input:?}")]
    InvalidPaymentMethod {
        input: String,
    },

    #[error("invalid record: {message}")]
    InvalidRecord {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    /// The change was saved, only the receipt is missing. Retrying the
    /// operation would apply it a second time.
    #[error("debts {debt_numbers:?} were saved but a receipt was not issued: {source}")]
    ReceiptFailed {
        debt_numbers: Vec<u64>,
        /// payment entries already in the store, empty for a new debt
        applications: Vec<PaymentApplication>,
        /// receipts written before and after the failure
        issued: Vec<ReceiptHandle>,
        #[source]
        source: Box<LedgerError>,
    },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode {}: {message}", path.display())]
    Decode {
        path: PathBuf,
        message: String,
    },
}

impl LedgerError {
    /// whether the failed operation still changed the store
    pub fn is_committed(&self) -> bool {
        matches!(self, LedgerError::ReceiptFailed { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LedgerError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_record(message: impl Into<String>) -> Self {
        LedgerError::InvalidRecord {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
