use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::errors::{LedgerError, Result};

use super::{Receipt, ReceiptHandle};

const RECEIPT_EXTENSION: &str = "txt";
const MAX_COLLISION_SUFFIX: u32 = 1000;

/// Write-once destination for receipts.
///
/// Implementations must never overwrite an existing receipt; a name clash
/// is resolved by picking a fresh identity.
pub trait ReceiptSink {
    fn write(&mut self, receipt: &Receipt) -> Result<ReceiptHandle>;
}

/// one `.txt` file per receipt
#[derive(Debug, Clone)]
pub struct DirectoryReceiptSink {
    dir: PathBuf,
}

impl DirectoryReceiptSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|err| LedgerError::io(&dir, err))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", id, RECEIPT_EXTENSION))
    }
}

impl ReceiptSink for DirectoryReceiptSink {
    fn write(&mut self, receipt: &Receipt) -> Result<ReceiptHandle> {
        for attempt in 1..=MAX_COLLISION_SUFFIX {
            let id = candidate_id(&receipt.id, attempt);
            let path = self.path_for(&id);
            let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(LedgerError::io(&path, err)),
            };
            fill_or_remove(file, &path, |file| file.write_all(receipt.body.as_bytes()))
                .map_err(|err| LedgerError::io(&path, err))?;

            return Ok(ReceiptHandle {
                id,
                kind: receipt.kind,
                location: Some(path),
            });
        }

        Err(LedgerError::io(
            self.path_for(&receipt.id),
            std::io::Error::new(ErrorKind::AlreadyExists, "no free receipt name"),
        ))
    }
}

/// keeps receipts in memory
#[derive(Debug, Default)]
pub struct MemoryReceiptSink {
    receipts: Vec<Receipt>,
}

impl MemoryReceiptSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    pub fn get(&self, id: &str) -> Option<&Receipt> {
        self.receipts.iter().find(|r| r.id == id)
    }
}

impl ReceiptSink for MemoryReceiptSink {
    fn write(&mut self, receipt: &Receipt) -> Result<ReceiptHandle> {
        let mut attempt = 1;
        let id = loop {
            let id = candidate_id(&receipt.id, attempt);
            if self.get(&id).is_none() {
                break id;
            }
            attempt += 1;
        };

        let mut stored = receipt.clone();
        stored.id = id.clone();
        self.receipts.push(stored);

        Ok(ReceiptHandle {
            id,
            kind: receipt.kind,
            location: None,
        })
    }
}

/// Fill a freshly created file and flush it to disk.
///
/// On failure the file is removed so its name is free for a later attempt.
fn fill_or_remove<F>(mut file: File, path: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let written = fill(&mut file).and_then(|_| file.sync_all());
    if let Err(err) = written {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %cleanup, "partial receipt left behind");
        }
        return Err(err);
    }
    Ok(())
}

fn candidate_id(base: &str, attempt: u32) -> String {
    if attempt == 1 {
        base.to_string()
    } else {
        format!("{}-{}", base, attempt)
    }
}
