//! Error types for valid-guard.
//!
//! The validation core never fails: bad input turns into data (`is_valid =
//! false`, sentinel regions, pass-through formatting). These errors only
//! cover the edges: submissions, file input and registry lookups.

use thiserror::Error;

/// Failure of a registry lookup. Mapped to `RegistryStatus::Error` by the
/// pipeline instead of leaving the record pending.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry unavailable: {0}")]
    Unavailable(String),

    #[error("registry lookup timed out after {0} ms")]
    Timeout(u64),
}

/// Main error type for the library.
#[derive(Debug, Error)]
pub enum ValidGuardError {
    /// Nothing to process (blank text or no candidates found).
    #[error("no id numbers to process")]
    EmptyInput,

    /// Reading an input file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Result type alias for valid-guard operations.
pub type Result<T> = std::result::Result<T, ValidGuardError>;
