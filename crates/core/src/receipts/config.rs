//! Receipt storage configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// Configuration for the receipt blob store.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptStorageConfig {
    /// Backend provider.
    pub provider: ReceiptStorageProvider,
    /// Base URL under which stored keys are retrievable.
    pub public_base_url: String,
}

/// Supported storage backends.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReceiptStorageProvider {
    /// S3-compatible object storage (AWS S3, Cloudflare R2, Supabase).
    S3 {
        /// Endpoint URL.
        endpoint: String,
        /// Bucket name.
        bucket: String,
        /// Access key id.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        region: String,
    },
    /// Local filesystem (development only).
    LocalFs {
        /// Root directory for stored blobs.
        root: PathBuf,
    },
}
