//! Error types for the quote service.

/// Top-level error type for the quote service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Configuration error (missing or unparsable setting).
    #[error("config error: {0}")]
    Config(String),

    /// HTTP server setup or runtime error.
    #[error("server error: {0}")]
    Server(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ServiceError>;
