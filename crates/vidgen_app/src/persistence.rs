use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vidgen_core::{CostEntry, CostLedger, SessionCost};
use vidgen_engine::{read_optional, write_atomic};
use vidgen_logging::{vg_error, vg_info, vg_warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedEntry {
    id: String,
    timestamp_ms: u64,
    amount: u64,
    api_calls: u32,
    description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedLedger {
    entries: Vec<PersistedEntry>,
}

/// RON-backed home of the cost ledger between runs.
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the ledger; unreadable or corrupt files yield an empty one.
    pub fn load(&self) -> CostLedger {
        let content = match read_optional(&self.path) {
            Ok(Some(text)) => text,
            Ok(None) => return CostLedger::new(),
            Err(err) => {
                vg_warn!("Failed to read cost ledger from {:?}: {}", self.path, err);
                return CostLedger::new();
            }
        };

        let persisted: PersistedLedger = match ron::from_str(&content) {
            Ok(ledger) => ledger,
            Err(err) => {
                vg_warn!("Failed to parse cost ledger from {:?}: {}", self.path, err);
                return CostLedger::new();
            }
        };

        let entries = persisted
            .entries
            .into_iter()
            .map(|entry| CostEntry {
                id: entry.id,
                timestamp_ms: entry.timestamp_ms,
                amount: entry.amount,
                api_calls: entry.api_calls,
                description: entry.description,
            })
            .collect::<Vec<_>>();
        vg_info!("Loaded {} ledger entries from {:?}", entries.len(), self.path);
        CostLedger::from_entries(entries)
    }

    pub fn save(&self, ledger: &CostLedger) -> bool {
        let persisted = PersistedLedger {
            entries: ledger
                .entries()
                .iter()
                .map(|entry| PersistedEntry {
                    id: entry.id.clone(),
                    timestamp_ms: entry.timestamp_ms,
                    amount: entry.amount,
                    api_calls: entry.api_calls,
                    description: entry.description.clone(),
                })
                .collect(),
        };

        let content = match ron::ser::to_string_pretty(&persisted, ron::ser::PrettyConfig::new()) {
            Ok(text) => text,
            Err(err) => {
                vg_error!("Failed to serialize cost ledger: {}", err);
                return false;
            }
        };

        match write_atomic(&self.path, &content) {
            Ok(()) => true,
            Err(err) => {
                vg_error!("Failed to write cost ledger to {:?}: {}", self.path, err);
                false
            }
        }
    }

    /// Appends a finished session and saves. Empty sessions leave the file alone.
    pub fn record_session(&self, cost: SessionCost, timestamp_ms: u64) -> CostLedger {
        let mut ledger = self.load();
        if ledger.record_session(cost, timestamp_ms) {
            self.save(&ledger);
        }
        ledger
    }
}
