//! Bounded quote history.
//!
//! Keeps the most recent generated quotes in insertion order (oldest first).
//! Uses a fixed-capacity ring buffer; appending at capacity evicts the oldest
//! entry before the new one is stored.

use serde::Serialize;
use std::collections::VecDeque;

/// Maximum number of quotes retained.
pub const MAX_HISTORY: usize = 30;

/// A stored quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteEntry {
    /// Generated or fallback text.
    #[serde(rename = "quote")]
    pub content: String,
    /// Creation time (`YYYY-MM-DD HH:MM:SS`, local time).
    pub timestamp: String,
}

/// Append-only quote history with fixed capacity.
#[derive(Debug, Clone)]
pub struct QuoteHistory {
    /// Entries in insertion order (oldest first).
    entries: VecDeque<QuoteEntry>,
    /// Maximum number of entries to retain.
    capacity: usize,
}

impl QuoteHistory {
    /// Create an empty history holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a quote at the tail, evicting from the head when full.
    ///
    /// Returns the stored entry.
    pub fn append(&mut self, content: impl Into<String>, timestamp: impl Into<String>) -> QuoteEntry {
        let entry = QuoteEntry {
            content: content.into(),
            timestamp: timestamp.into(),
        };

        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry.clone());
        entry
    }

    /// All entries, oldest to newest.
    #[must_use]
    pub fn all(&self) -> Vec<QuoteEntry> {
        self.entries.iter().cloned().collect()
    }

    /// The most recently appended entry.
    #[must_use]
    pub fn latest(&self) -> Option<&QuoteEntry> {
        self.entries.back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for QuoteHistory {
    fn default() -> Self {
        Self::new(MAX_HISTORY)
    }
}
