//! Receipt storage error types.

use thiserror::Error;

/// Errors from the receipt blob store.
#[derive(Debug, Error)]
pub enum ReceiptStorageError {
    /// The storage provider could not be initialized.
    #[error("Storage configuration error: {0}")]
    Configuration(String),

    /// The backend rejected or failed an operation.
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// No blob exists under the requested key.
    #[error("Receipt not found: {0}")]
    NotFound(String),
}

impl ReceiptStorageError {
    pub(crate) fn from_opendal(err: opendal::Error) -> Self {
        if err.kind() == opendal::ErrorKind::NotFound {
            Self::NotFound(err.to_string())
        } else {
            Self::Backend(err.to_string())
        }
    }
}
