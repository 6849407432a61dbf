//! Receipt blob storage.
//!
//! The ledger never inspects receipt content: it stores the bytes with an
//! owner-scoped key and persists the returned URL on the expense record.

pub mod config;
pub mod error;
pub mod service;

pub use config::{ReceiptStorageConfig, ReceiptStorageProvider};
pub use error::ReceiptStorageError;
pub use service::{ReceiptStore, StoredReceipt};
