//! Shared test utilities used across multiple test modules.

use crate::generator::QuoteSource;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Quote source returning `"{prefix}1"`, `"{prefix}2"`, ... and counting calls.
pub struct SequenceSource {
    prefix: String,
    calls: AtomicUsize,
}

impl SequenceSource {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_owned(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSource for SequenceSource {
    async fn generate(&self) -> String {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        // Yield so concurrent callers interleave.
        tokio::task::yield_now().await;
        format!("{}{n}", self.prefix)
    }
}
