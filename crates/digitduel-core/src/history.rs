//! Append-only guess history with idempotent inserts.

use std::collections::HashSet;

use digitduel_proto::{GuessRecord, PlayerId};

/// Deduplicated, ordered collection of guess records.
///
/// Records arrive from two unordered sources (turn-outcome notifications and
/// history backfills), so insertion is idempotent on the structural key
/// (`player_id`, `guess_number`). Arrival order is preserved; any
/// most-recent-first presentation is the caller's concern. There is no
/// removal: the ledger is append-only for the session's lifetime.
#[derive(Debug, Clone, Default)]
pub struct HistoryLedger {
    records: Vec<GuessRecord>,
    seen: HashSet<(PlayerId, u32)>,
}

impl HistoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record unless its (`player_id`, `guess_number`) identity is
    /// already present. Returns whether the record was newly inserted.
    pub fn append(&mut self, record: GuessRecord) -> bool {
        let key = (record.player_id.clone(), record.guess_number);
        if !self.seen.insert(key) {
            return false;
        }
        self.records.push(record);
        true
    }

    /// All records for one participant, in arrival order.
    pub fn all_for<'a>(&'a self, player_id: &'a str) -> impl Iterator<Item = &'a GuessRecord> {
        self.records.iter().filter(move |r| r.player_id == player_id)
    }

    /// All records in arrival order.
    pub fn records(&self) -> &[GuessRecord] {
        &self.records
    }

    /// Number of distinct records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the ledger holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
