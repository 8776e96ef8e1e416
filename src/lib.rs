pub mod balance;
pub mod config;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod events;
pub mod payments;
pub mod receipt;
pub mod records;
pub mod statement;
pub mod store;
pub mod telemetry;
pub mod types;

// re-export key types
pub use config::{LedgerConfig, ReceiptConfig};
pub use decimal::Money;
pub use engine::{LedgerEngine, PaymentOutcome, RegisteredDebt};
pub use errors::{LedgerError, Result};
pub use events::{Event, EventStore};
pub use payments::{Allocation, InstallmentPlan, OverpaymentPolicy, PaymentAllocator, PaymentRequest};
pub use receipt::{
    DirectoryReceiptSink, MemoryReceiptSink, Receipt, ReceiptEvent, ReceiptGenerator,
    ReceiptHandle, ReceiptKind, ReceiptSink,
};
pub use records::{Client, Debt, Installment, Payment};
pub use statement::{ClientStatement, DebtSummary};
pub use store::{JsonRecordStore, MemoryRecordStore, RecordStore};
pub use telemetry::init_tracing;
pub use types::{ClientId, DebtId, DebtStatus, PaymentApplication, PaymentId, PaymentMethod};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
