//! Session-scoped accounting of backend calls.
//!
//! The ledger is a plain value owned by the caller. Loading it before a
//! session and saving it afterwards is the caller's job; nothing here is
//! global.

/// Charge applied to every backend call (submit or status check).
pub const COST_PER_CALL: u64 = 100;

/// Running cost of the current generation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionCost {
    pub api_calls: u32,
    pub amount: u64,
}

impl SessionCost {
    pub fn charge_call(&mut self) {
        self.api_calls = self.api_calls.saturating_add(1);
        self.amount = self.amount.saturating_add(COST_PER_CALL);
    }

    pub fn is_empty(&self) -> bool {
        self.amount == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostEntry {
    pub id: String,
    pub timestamp_ms: u64,
    pub amount: u64,
    pub api_calls: u32,
    pub description: String,
}

impl CostEntry {
    pub fn for_session(cost: SessionCost, timestamp_ms: u64) -> Self {
        Self {
            id: format!("session-{timestamp_ms}"),
            timestamp_ms,
            amount: cost.amount,
            api_calls: cost.api_calls,
            description: format!("Video generation ({} API calls)", cost.api_calls),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CostLedger {
    entries: Vec<CostEntry>,
}

impl CostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<CostEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CostEntry] {
        &self.entries
    }

    /// Appends a finished session. Sessions that cost nothing are skipped;
    /// returns whether an entry was added.
    pub fn record_session(&mut self, cost: SessionCost, timestamp_ms: u64) -> bool {
        if cost.is_empty() {
            return false;
        }
        self.record(CostEntry::for_session(cost, timestamp_ms));
        true
    }

    pub fn record(&mut self, entry: CostEntry) {
        self.entries.push(entry);
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|entry| entry.amount).sum()
    }

    pub fn total_calls(&self) -> u64 {
        self.entries.iter().map(|entry| entry.api_calls as u64).sum()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
