//! Quote service state shared by the HTTP handlers and the scheduler.

use crate::clock::{Clock, format_timestamp};
use crate::generator::QuoteSource;
use crate::history::{QuoteEntry, QuoteHistory};
use crate::scheduler::DailyJob;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

/// Owns the quote history and the source that feeds it.
pub struct QuoteService {
    source: Arc<dyn QuoteSource>,
    clock: Arc<dyn Clock>,
    history: RwLock<QuoteHistory>,
    /// Serializes generate-on-empty so concurrent readers produce one entry.
    fill: Mutex<()>,
}

impl QuoteService {
    pub fn new(source: Arc<dyn QuoteSource>, clock: Arc<dyn Clock>) -> Self {
        Self::with_history(source, clock, QuoteHistory::default())
    }

    /// Create a service around an existing history.
    pub fn with_history(
        source: Arc<dyn QuoteSource>,
        clock: Arc<dyn Clock>,
        history: QuoteHistory,
    ) -> Self {
        Self {
            source,
            clock,
            history: RwLock::new(history),
            fill: Mutex::new(()),
        }
    }

    /// Generate a quote and append it to the history.
    ///
    /// The provider call runs outside the history lock; only the append is
    /// exclusive.
    pub async fn generate_and_store(&self) -> QuoteEntry {
        let content = self.source.generate().await;
        self.store(content).await
    }

    async fn store(&self, content: String) -> QuoteEntry {
        let mut history = self.history.write().await;
        // Stamp under the lock so timestamps follow append order.
        let timestamp = format_timestamp(&self.clock.now());
        let entry = history.append(content, timestamp);
        drop(history);

        info!("quote stored at {}: {}", entry.timestamp, entry.content);
        entry
    }

    /// Snapshot of the history, oldest first.
    pub async fn quotes(&self) -> Vec<QuoteEntry> {
        self.history.read().await.all()
    }

    /// The newest quote, generating one first when the history is empty.
    pub async fn latest(&self) -> QuoteEntry {
        if let Some(entry) = self.history.read().await.latest().cloned() {
            return entry;
        }

        let _fill = self.fill.lock().await;
        if let Some(entry) = self.history.read().await.latest().cloned() {
            return entry;
        }
        info!("history empty, generating a quote on demand");
        self.generate_and_store().await
    }

    pub async fn history_len(&self) -> usize {
        self.history.read().await.len()
    }
}

#[async_trait]
impl DailyJob for QuoteService {
    type Output = QuoteEntry;

    async fn run(&self) -> QuoteEntry {
        self.generate_and_store().await
    }
}
