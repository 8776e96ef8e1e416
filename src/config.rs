use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};
use crate::payments::OverpaymentPolicy;

/// ledger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub data_dir: PathBuf,
    pub clients_file: String,
    pub debts_file: String,
    /// relative paths are resolved under `data_dir`
    pub receipts_dir: PathBuf,
    pub overpayment_policy: OverpaymentPolicy,
    pub receipt: ReceiptConfig,
}

/// receipt rendering options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptConfig {
    pub header: String,
    /// longest client-name fragment used in a receipt identity
    pub client_name_max_len: usize,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            header: "DEBT LEDGER RECEIPT".to_string(),
            client_name_max_len: 20,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            clients_file: "clients.json".to_string(),
            debts_file: "debts.json".to_string(),
            receipts_dir: PathBuf::from("receipts"),
            overpayment_policy: OverpaymentPolicy::Reject,
            receipt: ReceiptConfig::default(),
        }
    }
}

impl LedgerConfig {
    /// hardened defaults rooted at `data_dir`
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Keeps the legacy shop behaviour of accepting payments larger than
    /// the debt, but reports the excess as change instead of dropping it.
    pub fn reference_compatible(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            overpayment_policy: OverpaymentPolicy::ReturnChange,
            ..Self::with_data_dir(data_dir)
        }
    }

    /// load from a json file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let data = fs::read_to_string(path).map_err(|err| LedgerError::io(path, err))?;
            serde_json::from_str(&data).map_err(|err| LedgerError::Decode {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let json = serde_json::to_string_pretty(self).map_err(|err| LedgerError::Decode {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| LedgerError::io(parent, err))?;
        }
        fs::write(path, json).map_err(|err| LedgerError::io(path, err))
    }

    pub fn validate(&self) -> Result<()> {
        if self.clients_file.trim().is_empty() || self.debts_file.trim().is_empty() {
            return Err(LedgerError::InvalidConfiguration {
                message: "record file names must not be empty".to_string(),
            });
        }
        if self.clients_file == self.debts_file {
            return Err(LedgerError::InvalidConfiguration {
                message: format!("clients and debts share the file {}", self.clients_file),
            });
        }
        if self.receipt.client_name_max_len == 0 {
            return Err(LedgerError::InvalidConfiguration {
                message: "receipt.client_name_max_len must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn clients_path(&self) -> PathBuf {
        self.data_dir.join(&self.clients_file)
    }

    pub fn debts_path(&self) -> PathBuf {
        self.data_dir.join(&self.debts_file)
    }

    pub fn receipts_path(&self) -> PathBuf {
        if self.receipts_dir.is_absolute() {
            self.receipts_dir.clone()
        } else {
            self.data_dir.join(&self.receipts_dir)
        }
    }
}
