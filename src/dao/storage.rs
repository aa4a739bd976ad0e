use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or failed the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Backend description of the failure.
        message: String,
        /// Underlying backend error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// Compare-and-swap write lost against a concurrent writer.
    #[error("game state version conflict (expected {expected:?}, found {found:?})")]
    Conflict {
        /// Version the writer read.
        expected: Option<u64>,
        /// Version actually stored.
        found: Option<u64>,
    },
    /// A unique key (roll number or email) is already taken.
    #[error("duplicate {field}: {value}")]
    Duplicate {
        /// Name of the unique field.
        field: &'static str,
        /// Value that is already taken.
        value: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
