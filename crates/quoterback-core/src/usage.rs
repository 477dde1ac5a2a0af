//! Per-quote usage counters.
//!
//! Counts only ever grow by one, except for a full reset. The whole map is
//! written back under the `usage` key after every change; write failures
//! are logged and otherwise ignored.

use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::Quote;
use crate::storage::{save_json, KeyValueStore, USAGE_KEY};

/// Owner of the usage map (`quote id -> times shown`).
pub struct UsageTracker {
    store: Arc<dyn KeyValueStore>,
    counts: HashMap<String, u64>,
}

impl UsageTracker {
    /// Load persisted counters. Unreadable or malformed data starts empty.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let counts = match store.load(USAGE_KEY) {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!("usage record malformed, starting empty: {e}");
                HashMap::new()
            }),
            Ok(None) => HashMap::new(),
            Err(e) => {
                tracing::warn!("failed to load usage, starting empty: {e}");
                HashMap::new()
            }
        };
        Self { store, counts }
    }

    /// Times `quote_id` was shown; unknown ids count as zero.
    pub fn usage_count(&self, quote_id: &str) -> u64 {
        self.counts.get(quote_id).copied().unwrap_or(0)
    }

    pub fn all(&self) -> &HashMap<String, u64> {
        &self.counts
    }

    pub fn increment_usage(&mut self, quote_id: &str) -> u64 {
        let count = self.counts.entry(quote_id.to_string()).or_insert(0);
        *count += 1;
        let count = *count;
        tracing::debug!("quote {quote_id} used {count} time(s)");
        self.persist();
        count
    }

    pub fn reset_usage(&mut self) {
        self.counts.clear();
        self.persist();
    }

    /// The `limit` least-used quotes of `candidates`, ascending by count.
    ///
    /// The sort is stable, so equally used quotes keep their input order.
    pub fn least_used<'a>(&self, candidates: &[&'a Quote], limit: usize) -> Vec<&'a Quote> {
        let mut sorted = candidates.to_vec();
        sorted.sort_by_key(|q| self.usage_count(&q.id));
        sorted.truncate(limit);
        sorted
    }

    fn persist(&self) {
        if let Err(e) = save_json(self.store.as_ref(), USAGE_KEY, &self.counts) {
            tracing::warn!("failed to save usage: {e}");
        }
    }
}
