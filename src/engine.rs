use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::{SafeTimeProvider, TimeSource};
use tracing::{info, warn};

use crate::balance;
use crate::config::LedgerConfig;
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::payments::{normalize_note, InstallmentPlan, PaymentAllocator, PaymentRequest};
use crate::receipt::{
    DirectoryReceiptSink, ReceiptEvent, ReceiptGenerator, ReceiptHandle, ReceiptSink,
};
use crate::records::{Client, Debt};
use crate::statement::ClientStatement;
use crate::store::{JsonRecordStore, RecordStore};
use crate::types::{ClientId, PaymentApplication};

/// a freshly registered debt and its opening receipt
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredDebt {
    pub debt: Debt,
    pub receipt: ReceiptHandle,
}

/// what happened to an incoming payment
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    /// oldest debt first
    pub applications: Vec<PaymentApplication>,
    /// one per debt touched, same order as `applications`
    pub receipts: Vec<ReceiptHandle>,
    /// excess handed back under `OverpaymentPolicy::ReturnChange`
    pub unapplied: Money,
    /// client-wide outstanding balance after the payment
    pub client_balance: Money,
}

impl PaymentOutcome {
    pub fn total_applied(&self) -> Money {
        self.applications.iter().map(|a| a.applied).sum()
    }
}

/// Ledger engine.
///
/// Every operation is a read-modify-write cycle against the store: load the
/// full collection, change it in memory, save the full collection. The engine
/// owns its store and mutating operations take `&mut self`, so one engine is
/// the single writer. Running two engines against the same files is not
/// supported.
pub struct LedgerEngine<S: RecordStore, R: ReceiptSink> {
    store: S,
    receipts: R,
    allocator: PaymentAllocator,
    generator: ReceiptGenerator,
    time: SafeTimeProvider,
    events: EventStore,
}

impl LedgerEngine<JsonRecordStore, DirectoryReceiptSink> {
    /// json files and receipt directory from config, system clock
    pub fn open(config: &LedgerConfig) -> Result<Self> {
        config.validate()?;
        let store = JsonRecordStore::from_config(config);
        let receipts = DirectoryReceiptSink::new(config.receipts_path())?;
        Self::new(
            store,
            receipts,
            config,
            SafeTimeProvider::new(TimeSource::System),
        )
    }
}

impl<S: RecordStore, R: ReceiptSink> LedgerEngine<S, R> {
    pub fn new(
        store: S,
        receipts: R,
        config: &LedgerConfig,
        time: SafeTimeProvider,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            receipts,
            allocator: PaymentAllocator::new(config.overpayment_policy),
            generator: ReceiptGenerator::new(config.receipt.clone()),
            time,
            events: EventStore::new(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn receipts(&self) -> &R {
        &self.receipts
    }

    pub fn time(&self) -> &SafeTimeProvider {
        &self.time
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    /// Look a client up by identifier, then full name, then nickname.
    ///
    /// Name and nickname comparisons ignore case and surrounding whitespace.
    pub fn find_client(&self, query: &str) -> Result<Client> {
        let query = query.trim();
        let clients = self.store.load_clients()?;
        let wanted = query.to_lowercase();

        clients
            .iter()
            .find(|c| c.id.as_str() == query)
            .or_else(|| {
                clients
                    .iter()
                    .find(|c| c.full_name.trim().to_lowercase() == wanted)
            })
            .or_else(|| {
                clients.iter().find(|c| {
                    let nickname = c.nickname.trim();
                    !nickname.is_empty() && nickname.to_lowercase() == wanted
                })
            })
            .cloned()
            .ok_or_else(|| LedgerError::ClientNotFound {
                client_id: ClientId::new(query),
            })
    }

    /// create an open debt and issue its opening receipt
    pub fn register_debt(
        &mut self,
        client_id: &ClientId,
        amount: Money,
        created_on: NaiveDate,
        note: Option<String>,
    ) -> Result<RegisteredDebt> {
        self.open_debt(client_id, amount, created_on, note, None)
    }

    /// register a debt with a projected installment schedule starting on `created_on`
    pub fn register_installment_debt(
        &mut self,
        client_id: &ClientId,
        amount: Money,
        count: u32,
        created_on: NaiveDate,
        note: Option<String>,
    ) -> Result<RegisteredDebt> {
        let plan = InstallmentPlan::generate(amount, count, created_on)?;
        self.open_debt(client_id, amount, created_on, note, Some(plan))
    }

    fn open_debt(
        &mut self,
        client_id: &ClientId,
        amount: Money,
        created_on: NaiveDate,
        note: Option<String>,
        plan: Option<InstallmentPlan>,
    ) -> Result<RegisteredDebt> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount {
                input: amount.to_string(),
            });
        }
        let client = self.require_client(client_id)?;

        let mut debts = self.store.load_debts()?;
        let number = debts.iter().map(|d| d.number).max().unwrap_or(0) + 1;
        let mut debt = Debt::new(number, client.id.clone(), amount, created_on, normalize_note(note));
        let plan_created = plan.map(|plan| {
            let event = Event::InstallmentPlanCreated {
                debt_id: debt.id,
                count: plan.count,
                per_installment: plan.per_installment,
                rounding_drift: plan.rounding_drift(),
            };
            debt.installments = plan.into_installments();
            event
        });

        debts.push(debt.clone());
        self.store.save_debts(&debts)?;

        info!(
            client = %client.id,
            debt = debt.number,
            amount = %amount,
            installments = debt.installments.len(),
            "debt registered"
        );
        self.events.emit(Event::DebtRegistered {
            debt_id: debt.id,
            number: debt.number,
            client_id: client.id.clone(),
            amount,
            created_on,
        });
        if let Some(event) = plan_created {
            self.events.emit(event);
        }

        let issued_at = self.time.now();
        let receipt = match self.issue(&client, &debt, ReceiptEvent::DebtOpened, issued_at) {
            Ok(receipt) => receipt,
            Err(err) => {
                warn!(client = %client.id, debt = debt.number, error = %err, "opening receipt not issued");
                return Err(LedgerError::ReceiptFailed {
                    debt_numbers: vec![debt.number],
                    applications: Vec::new(),
                    issued: Vec::new(),
                    source: Box::new(err),
                });
            }
        };

        Ok(RegisteredDebt { debt, receipt })
    }

    /// Apply an incoming payment to the client's open debts, oldest first.
    ///
    /// Mutated debts are saved before any receipt is written; one
    /// payment receipt is issued per debt touched. A receipt that cannot be
    /// written after the save yields [`LedgerError::ReceiptFailed`], which
    /// carries the applications already in the store.
    pub fn apply_payment(&mut self, request: PaymentRequest) -> Result<PaymentOutcome> {
        request.validate()?;
        let client = self.require_client(&request.client_id)?;
        let mut debts = self.store.load_debts()?;

        let allocation = match self.allocator.allocate(
            debts.iter_mut().filter(|d| d.client_id == client.id),
            &request,
            &mut self.events,
        ) {
            Ok(allocation) => allocation,
            Err(err) => {
                warn!(client = %client.id, amount = %request.amount, error = %err, "payment refused");
                return Err(err);
            }
        };

        for application in allocation.applications.iter().filter(|a| a.closes_debt()) {
            let debt = find_debt_mut(&mut debts, application)?;
            if debt.mark_closed(request.paid_at) {
                info!(client = %client.id, debt = debt.number, "debt closed");
                self.events.emit(Event::DebtClosed {
                    debt_id: debt.id,
                    number: debt.number,
                    closed_at: request.paid_at,
                });
            }
        }

        if allocation.unapplied.is_positive() {
            warn!(
                client = %client.id,
                requested = %request.amount,
                returned = %allocation.unapplied,
                "payment exceeds outstanding balance, excess returned"
            );
            self.events.emit(Event::OverpaymentReturned {
                client_id: client.id.clone(),
                requested: request.amount,
                returned: allocation.unapplied,
            });
        }

        self.store.save_debts(&debts)?;

        let client_balance = balance::client_outstanding(&debts, &client.id);
        info!(
            client = %client.id,
            applied = %allocation.total_applied(),
            debts = allocation.applications.len(),
            balance = %client_balance,
            "payment applied"
        );

        let issued_at = self.time.now();
        let mut running = allocation.outstanding_before;
        let mut receipts = Vec::with_capacity(allocation.applications.len());
        let mut failure = None;
        for application in &allocation.applications {
            running -= application.applied;
            match self.issue_payment_receipt(&client, &debts, application, running, issued_at) {
                Ok(handle) => receipts.push(handle),
                Err(err) => {
                    warn!(
                        client = %client.id,
                        debt = application.debt_number,
                        error = %err,
                        "payment receipt not issued"
                    );
                    if failure.is_none() {
                        failure = Some(err);
                    }
                }
            }
        }

        if let Some(err) = failure {
            return Err(LedgerError::ReceiptFailed {
                debt_numbers: allocation.applications.iter().map(|a| a.debt_number).collect(),
                applications: allocation.applications,
                issued: receipts,
                source: Box::new(err),
            });
        }

        Ok(PaymentOutcome {
            applications: allocation.applications,
            receipts,
            unapplied: allocation.unapplied,
            client_balance,
        })
    }

    fn issue_payment_receipt(
        &mut self,
        client: &Client,
        debts: &[Debt],
        application: &PaymentApplication,
        running: Money,
        issued_at: DateTime<Utc>,
    ) -> Result<ReceiptHandle> {
        let debt = debts
            .iter()
            .find(|d| d.id == application.debt_id)
            .ok_or(LedgerError::DebtNotFound {
                debt_id: application.debt_id,
            })?;
        let payment = debt
            .payments
            .iter()
            .find(|p| p.id == application.payment_id)
            .ok_or_else(|| {
                LedgerError::invalid_record(format!(
                    "payment {} missing from debt #{}",
                    application.payment_id, debt.number
                ))
            })?;

        self.issue(
            client,
            debt,
            ReceiptEvent::PaymentApplied {
                payment,
                client_running_balance: Some(running),
            },
            issued_at,
        )
    }

    /// render, write and record one receipt
    fn issue(
        &mut self,
        client: &Client,
        debt: &Debt,
        event: ReceiptEvent<'_>,
        issued_at: DateTime<Utc>,
    ) -> Result<ReceiptHandle> {
        let handle = self
            .generator
            .emit(&mut self.receipts, client, debt, event, issued_at)?;
        self.events.emit(Event::ReceiptIssued {
            debt_id: debt.id,
            kind: handle.kind,
            receipt_id: handle.id.clone(),
            issued_at,
        });
        Ok(handle)
    }

    /// total outstanding over every debt of the client, closed ones count as zero
    pub fn query_balance(&self, client_id: &ClientId) -> Result<Money> {
        let client = self.require_client(client_id)?;
        let debts = self.store.load_debts()?;
        Ok(balance::client_outstanding(&debts, &client.id))
    }

    /// all debts of the client in creation order
    pub fn debts_for(&self, client_id: &ClientId) -> Result<Vec<Debt>> {
        let client = self.require_client(client_id)?;
        let mut debts: Vec<Debt> = self
            .store
            .load_debts()?
            .into_iter()
            .filter(|d| d.client_id == client.id)
            .collect();
        debts.sort_by_key(|d| d.number);
        Ok(debts)
    }

    pub fn statement(&self, client_id: &ClientId) -> Result<ClientStatement> {
        let client = self.require_client(client_id)?;
        let debts = self.store.load_debts()?;
        Ok(ClientStatement::build(&client, &debts))
    }

    fn require_client(&self, client_id: &ClientId) -> Result<Client> {
        self.store
            .load_clients()?
            .into_iter()
            .find(|c| &c.id == client_id)
            .ok_or_else(|| LedgerError::ClientNotFound {
                client_id: client_id.clone(),
            })
    }
}

fn find_debt_mut<'a>(debts: &'a mut [Debt], application: &PaymentApplication) -> Result<&'a mut Debt> {
    debts
        .iter_mut()
        .find(|d| d.id == application.debt_id)
        .ok_or(LedgerError::DebtNotFound {
            debt_id: application.debt_id,
        })
}
