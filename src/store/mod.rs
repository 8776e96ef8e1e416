pub mod json;

use crate::errors::Result;
use crate::records::{validate_clients, validate_debts, Client, Debt};

pub use json::JsonRecordStore;

/// Persistence contract for client and debt collections.
///
/// Every call moves a whole collection. An absent backing store loads as an
/// empty collection; a present but unreadable one is an error.
pub trait RecordStore {
    fn load_clients(&self) -> Result<Vec<Client>>;
    fn save_clients(&mut self, clients: &[Client]) -> Result<()>;
    fn load_debts(&self) -> Result<Vec<Debt>>;
    fn save_debts(&mut self, debts: &[Debt]) -> Result<()>;
}

/// in-memory store, validates on save like the file store does on load
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    clients: Vec<Client>,
    debts: Vec<Debt>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clients(clients: Vec<Client>) -> Result<Self> {
        validate_clients(&clients)?;
        Ok(Self {
            clients,
            debts: Vec::new(),
        })
    }
}

impl RecordStore for MemoryRecordStore {
    fn load_clients(&self) -> Result<Vec<Client>> {
        Ok(self.clients.clone())
    }

    fn save_clients(&mut self, clients: &[Client]) -> Result<()> {
        validate_clients(clients)?;
        self.clients = clients.to_vec();
        Ok(())
    }

    fn load_debts(&self) -> Result<Vec<Debt>> {
        Ok(self.debts.clone())
    }

    fn save_debts(&mut self, debts: &[Debt]) -> Result<()> {
        validate_debts(debts)?;
        self.debts = debts.to_vec();
        Ok(())
    }
}
