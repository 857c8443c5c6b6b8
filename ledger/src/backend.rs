//! Ledger backends.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::LedgerError;
use crate::ledger::Ledger;

/// A source of closed ledgers.
///
/// Backends are polled strictly in ascending sequence order by a single
/// caller. `Ok(None)` means the backend has no ledger at that sequence
/// and never will (a drained replay source); a live transport would
/// instead wait for the ledger to close.
pub trait LedgerBackend {
    fn get_ledger(
        &mut self,
        sequence: u32,
    ) -> impl std::future::Future<Output = Result<Option<Ledger>, LedgerError>> + Send;
}

/// An in-memory backend serving a fixed set of ledgers.
///
/// Used in tests and to replay captured ledger dumps offline. Dumps are
/// newline-delimited JSON, one ledger per line.
#[derive(Debug, Default)]
pub struct StaticLedgerBackend {
    ledgers: BTreeMap<u32, Ledger>,
}

impl StaticLedgerBackend {
    pub fn new(ledgers: impl IntoIterator<Item = Ledger>) -> Self {
        Self {
            ledgers: ledgers.into_iter().map(|l| (l.sequence, l)).collect(),
        }
    }

    /// Load a newline-delimited JSON ledger dump. Blank lines are
    /// ignored; duplicate sequences keep the last occurrence.
    pub fn from_json_file(path: &Path) -> Result<Self, LedgerError> {
        let file = std::fs::File::open(path)
            .map_err(|e| LedgerError::Dump(format!("{}: {e}", path.display())))?;
        let mut ledgers = BTreeMap::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| LedgerError::Dump(format!("{}: {e}", path.display())))?;
            if line.trim().is_empty() {
                continue;
            }
            let ledger: Ledger = serde_json::from_str(&line).map_err(|e| {
                LedgerError::Serialization(format!(
                    "{} line {}: {e}",
                    path.display(),
                    line_no + 1
                ))
            })?;
            ledgers.insert(ledger.sequence, ledger);
        }
        Ok(Self { ledgers })
    }

    pub fn len(&self) -> usize {
        self.ledgers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledgers.is_empty()
    }

    /// Lowest ledger sequence held, if any.
    pub fn first_sequence(&self) -> Option<u32> {
        self.ledgers.keys().next().copied()
    }
}

impl LedgerBackend for StaticLedgerBackend {
    async fn get_ledger(&mut self, sequence: u32) -> Result<Option<Ledger>, LedgerError> {
        Ok(self.ledgers.get(&sequence).cloned())
    }
}
