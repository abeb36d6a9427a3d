//! Error types for the WARDEN engine.
//!
//! All fallible operations return `WardenResult<T>`.  The absence of a
//! matching grant is never an error; it resolves to `Decision::Unspecified`.

use thiserror::Error;

/// The unified error type for the WARDEN crates.
#[derive(Debug, Error)]
pub enum WardenError {
    /// The grant store could not complete a read or write.
    ///
    /// The engine does not retry; retry policy belongs to the caller.
    #[error("grant store error: {reason}")]
    Store { reason: String },

    /// A target reference was malformed and no query was issued.
    #[error("invalid target: {reason}")]
    InvalidTarget { reason: String },

    /// A seed file, registry, or other configuration input is invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

/// Convenience alias used throughout the WARDEN crates.
pub type WardenResult<T> = Result<T, WardenError>;
