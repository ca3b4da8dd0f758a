//! Error types for clip-pool
//!
//! Two layers: [`Error`] for fallible operations inside the crate (I/O,
//! engine faults, configuration), and [`LoadError`] for the terminal
//! failure kinds a batch callback can observe.

use thiserror::Error;

/// Convenience Result type using the crate Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for clip-pool operations
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O errors while reading clip bytes
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audio engine refused an operation
    #[error("Engine error: {0}")]
    Engine(String),
}

/// Terminal failure kinds surfaced through the batch callback.
///
/// Exactly one of these (or the success outcome) reaches the caller per
/// started batch; nothing else crosses the component boundary once `load`
/// has returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The caller supplied no requests. Reported synchronously from
    /// `load`, before any session or timer exists.
    #[error("no clip requests supplied")]
    NoRequests,

    /// Reading a clip's bytes or handing it to the engine faulted. The
    /// whole batch fails, even if other clips had already decoded.
    #[error("submission failed: {0}")]
    Submission(String),

    /// Not every clip reported a successful decode before the deadline.
    #[error("batch load timed out")]
    Timeout,
}
