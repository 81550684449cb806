//! Storage for the original uploaded PDFs.

mod local;
mod supabase;

pub use local::{FILES_ROUTE, LocalBlobStore};
pub use supabase::SupabaseBlobStore;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;

use crate::config::{AppConfig, BlobBackend};
use crate::error::{Error, Result};
use crate::util::sanitize_file_name;

#[async_trait]
pub trait BlobStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Store `bytes` under `key`. Never overwrites an existing object.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Publicly resolvable URL of a stored object
    fn public_url(&self, key: &str) -> String;
}

/// Collision-resistant object name: `<unix-millis>-<sanitized file name>`.
pub fn blob_key(file_name: &str) -> String {
    format!("{}-{}", Utc::now().timestamp_millis(), sanitize_file_name(file_name))
}

/// Create the configured blob store
pub fn create_blob_store(config: &AppConfig) -> Result<Arc<dyn BlobStore>> {
    let store: Arc<dyn BlobStore> = match config.blob.backend {
        BlobBackend::Local => Arc::new(LocalBlobStore::new(
            config.blob_dir(),
            config.blob.public_base_url.clone(),
        )?),
        BlobBackend::Supabase => {
            let (Some(url), Some(key)) = (&config.blob.supabase_url, &config.blob.supabase_key)
            else {
                return Err(Error::ConfigInvalid {
                    field: "blob".to_string(),
                    reason: "supabase_url and supabase_key are required".to_string(),
                });
            };
            Arc::new(SupabaseBlobStore::new(url, key, &config.blob.bucket)?)
        }
    };
    Ok(store)
}
