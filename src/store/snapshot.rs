use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::models::SymbolRecord;

/// Result of one completed scan cycle, keyed by symbol. Never mutated after
/// it is built.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Cycle sequence number; 0 is the empty snapshot served before any cycle
    pub sequence: u64,

    /// When the producing cycle finished
    pub completed_at: Option<DateTime<Utc>>,

    pub records: BTreeMap<String, SymbolRecord>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(sequence: u64, records: impl IntoIterator<Item = SymbolRecord>) -> Self {
        Self {
            sequence,
            completed_at: Some(Utc::now()),
            records: records
                .into_iter()
                .map(|record| (record.symbol.clone(), record))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<&SymbolRecord> {
        self.records.get(symbol)
    }

    /// Records ordered by symbol
    pub fn records(&self) -> impl Iterator<Item = &SymbolRecord> {
        self.records.values()
    }
}
