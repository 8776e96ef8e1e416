use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::balance;
use crate::config::LedgerConfig;
use crate::errors::{LedgerError, Result};
use crate::records::{validate_clients, validate_debts, Client, Debt};

use super::RecordStore;

const TMP_SUFFIX: &str = "tmp";

/// Filesystem-backed JSON persistence for clients and debts.
///
/// Each collection is one pretty-printed JSON array. Saves go through a
/// sibling temp file that is renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonRecordStore {
    clients_path: PathBuf,
    debts_path: PathBuf,
}

impl JsonRecordStore {
    pub fn new(clients_path: PathBuf, debts_path: PathBuf) -> Self {
        Self {
            clients_path,
            debts_path,
        }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.clients_path(), config.debts_path())
    }

    pub fn clients_path(&self) -> &Path {
        &self.clients_path
    }

    pub fn debts_path(&self) -> &Path {
        &self.debts_path
    }
}

impl RecordStore for JsonRecordStore {
    fn load_clients(&self) -> Result<Vec<Client>> {
        let clients: Vec<Client> = load_collection(&self.clients_path)?;
        validate_clients(&clients)?;
        Ok(clients)
    }

    fn save_clients(&mut self, clients: &[Client]) -> Result<()> {
        validate_clients(clients)?;
        save_collection(&self.clients_path, clients)
    }

    fn load_debts(&self) -> Result<Vec<Debt>> {
        let debts: Vec<Debt> = load_collection(&self.debts_path)?;
        validate_debts(&debts)?;
        for debt in debts.iter().filter(|d| balance::overpaid(d).is_positive()) {
            warn!(
                debt = debt.number,
                client = %debt.client_id,
                overpaid = %balance::overpaid(debt),
                "debt was paid beyond its original amount"
            );
        }
        Ok(debts)
    }

    fn save_debts(&mut self, debts: &[Debt]) -> Result<()> {
        validate_debts(debts)?;
        save_collection(&self.debts_path, debts)
    }
}

fn load_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        debug!(path = %path.display(), "no backing file, starting empty");
        return Ok(Vec::new());
    }
    let data = fs::read_to_string(path).map_err(|err| LedgerError::io(path, err))?;
    serde_json::from_str(&data).map_err(|err| LedgerError::Decode {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

fn save_collection<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| LedgerError::io(parent, err))?;
    }
    let json = serde_json::to_string_pretty(items).map_err(|err| LedgerError::Decode {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    let tmp = tmp_path(path);
    write_atomic(&tmp, &json).map_err(|err| LedgerError::io(&tmp, err))?;
    fs::rename(&tmp, path).map_err(|err| LedgerError::io(path, err))?;
    debug!(path = %path.display(), count = items.len(), "collection saved");
    Ok(())
}

fn write_atomic(path: &Path, data: &str) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    file.sync_all()
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::records::Payment;
    use crate::types::{ClientId, PaymentMethod};
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> JsonRecordStore {
        JsonRecordStore::from_config(&LedgerConfig::with_data_dir(dir))
    }

    fn sample_debts() -> Vec<Debt> {
        let created = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let mut first = Debt::new(1, ClientId::new("111"), Money::from_minor(30_000), created, Some("tv".to_string()));
        first.payments.push(Payment::new(
            Money::from_minor(12_345),
            created.and_hms_opt(16, 20, 0).unwrap(),
            PaymentMethod::DebitCard,
            Some("first".to_string()),
        ));
        let second = Debt::new(2, ClientId::new("222"), Money::from_minor(999), created, None);
        vec![first, second]
    }

    #[test]
    fn test_missing_files_load_empty() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(dir.path());

        assert!(store.load_clients().unwrap().is_empty());
        assert!(store.load_debts().unwrap().is_empty());
    }

    #[test]
    fn test_debts_round_trip() {
        let dir = tempdir().expect("tempdir");
        let mut store = store_in(dir.path());
        let debts = sample_debts();

        store.save_debts(&debts).expect("save debts");
        let loaded = store.load_debts().expect("load debts");
        assert_eq!(loaded, debts);

        // saving what was loaded reproduces the same file
        let before = fs::read_to_string(store.debts_path()).unwrap();
        store.save_debts(&loaded).unwrap();
        let after = fs::read_to_string(store.debts_path()).unwrap();
        assert_eq!(before, after);
        assert!(!tmp_path(store.debts_path()).exists());
    }

    #[test]
    fn test_clients_round_trip() {
        let dir = tempdir().expect("tempdir");
        let mut store = store_in(dir.path());
        let clients = vec![
            Client::new("111", "Ana Souza", "9999").with_nickname("Aninha"),
            Client::new("222", "Bruno Lima", "8888").with_address("Rua A, 10"),
        ];

        store.save_clients(&clients).unwrap();
        assert_eq!(store.load_clients().unwrap(), clients);
    }

    #[test]
    fn test_corrupt_file_is_not_emptied() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(dir.path());
        fs::write(store.debts_path(), "[{\"id\": ").unwrap();

        let err = store.load_debts().unwrap_err();
        assert!(matches!(err, LedgerError::Decode { .. }));
        // the damaged file stays for inspection
        assert_eq!(fs::read_to_string(store.debts_path()).unwrap(), "[{\"id\": ");
    }

    #[test]
    fn test_invalid_record_on_load() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(dir.path());
        fs::write(
            store.clients_path(),
            r#"[{"id": "111", "full_name": "Ana", "phone": ""}]"#,
        )
        .unwrap();

        assert!(matches!(store.load_clients(), Err(LedgerError::InvalidRecord { .. })));
    }

    #[test]
    fn test_overpaid_debt_still_loads() {
        let dir = tempdir().expect("tempdir");
        let mut store = store_in(dir.path());
        let created = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let paid_at = created.and_hms_opt(9, 0, 0).unwrap();

        let mut debt = Debt::new(1, ClientId::new("111"), Money::from_major(40), created, None);
        debt.payments.push(Payment::new(Money::from_major(100), paid_at, PaymentMethod::Cash, None));
        debt.closed_at = Some(paid_at);
        store.save_debts(&[debt]).unwrap();

        let loaded = store.load_debts().unwrap();
        assert_eq!(loaded[0].balance(), Money::from_major(-60));
        assert_eq!(loaded[0].outstanding(), Money::ZERO);
    }

    #[test]
    fn test_tmp_path() {
        assert_eq!(tmp_path(Path::new("/a/debts.json")), PathBuf::from("/a/debts.json.tmp"));
        assert_eq!(tmp_path(Path::new("/a/debts")), PathBuf::from("/a/debts.tmp"));
    }
}
