//! Datenote: a small HTTP service handing out AI-generated dating suggestions.
//!
//! # Architecture
//!
//! - **Generator**: asks an OpenAI-compatible chat endpoint for one short
//!   quote, falling back to a canned line on any failure
//! - **History**: bounded in-memory store of the most recent quotes
//! - **Scheduler**: at most one daily job that generates and stores a quote
//! - **Server**: axum routes over the service, optionally behind `X-API-Key`

pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod generator;
pub mod history;
pub mod scheduler;
pub mod server;
pub mod service;

#[cfg(test)]
mod test_utils;

pub use app::App;
pub use config::ServiceConfig;
pub use error::{Result, ServiceError};
pub use history::{MAX_HISTORY, QuoteEntry, QuoteHistory};
pub use service::QuoteService;
