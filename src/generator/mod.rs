//! Quote generation.
//!
//! [`QuoteSource`] is the seam between the service and whatever produces
//! quote text. [`QuoteGenerator`] is the production source: one call to an
//! OpenAI-compatible chat-completions endpoint, with a fallback quote
//! substituted on any failure.

pub mod client;
pub mod picker;
pub mod prompts;

use async_trait::async_trait;

pub use client::{GenerationError, GenerationOutcome, QuoteGenerator};
pub use picker::Picker;

/// Produces quote text. Never fails; implementations absorb their own errors.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Produce one non-empty quote.
    async fn generate(&self) -> String;
}
