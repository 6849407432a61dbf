//! Receipt store implementation using Apache OpenDAL.

use opendal::{Operator, services};
use uuid::Uuid;
use viatix_shared::types::UserId;

use super::config::{ReceiptStorageConfig, ReceiptStorageProvider};
use super::error::ReceiptStorageError;

/// A stored receipt: the backend key and the URL persisted on the expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredReceipt {
    /// Backend storage key.
    pub key: String,
    /// Retrievable URL.
    pub url: String,
}

/// Blob store for receipt and voucher images.
pub struct ReceiptStore {
    operator: Operator,
    public_base_url: String,
}

impl ReceiptStore {
    /// Create a receipt store from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: &ReceiptStorageConfig) -> Result<Self, ReceiptStorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self {
            operator,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create an OpenDAL operator from provider config.
    fn create_operator(
        provider: &ReceiptStorageProvider,
    ) -> Result<Operator, ReceiptStorageError> {
        match provider {
            ReceiptStorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Ok(Operator::new(builder)
                    .map_err(|e| ReceiptStorageError::Configuration(e.to_string()))?
                    .finish())
            }
            ReceiptStorageProvider::LocalFs { root } => {
                let root = root
                    .to_str()
                    .ok_or_else(|| ReceiptStorageError::Configuration("invalid path".into()))?;
                let builder = services::Fs::default().root(root);

                Ok(Operator::new(builder)
                    .map_err(|e| ReceiptStorageError::Configuration(e.to_string()))?
                    .finish())
            }
        }
    }

    /// Stores receipt bytes under an owner-scoped key and returns the URL to
    /// persist on the expense record.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    pub async fn store(
        &self,
        owner: UserId,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredReceipt, ReceiptStorageError> {
        let key = format!(
            "receipts/{owner}/{}-{}",
            Uuid::new_v4(),
            sanitize_filename(filename)
        );

        self.operator
            .write(&key, bytes)
            .await
            .map_err(ReceiptStorageError::from_opendal)?;

        let url = format!("{}/{key}", self.public_base_url);
        Ok(StoredReceipt { key, url })
    }

    /// Reads back a stored receipt.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown keys.
    pub async fn fetch(&self, key: &str) -> Result<Vec<u8>, ReceiptStorageError> {
        let buffer = self
            .operator
            .read(key)
            .await
            .map_err(ReceiptStorageError::from_opendal)?;
        Ok(buffer.to_vec())
    }

    /// Deletes a stored receipt. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend delete fails.
    pub async fn delete(&self, key: &str) -> Result<(), ReceiptStorageError> {
        self.operator
            .delete(key)
            .await
            .map_err(ReceiptStorageError::from_opendal)
    }
}

/// Keeps alphanumerics, dots, dashes and underscores; everything else
/// becomes an underscore.
fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
