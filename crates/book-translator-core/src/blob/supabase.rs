use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::BlobStore;
use crate::error::{Error, Result};

/// Supabase Storage bucket accessed over its REST API.
pub struct SupabaseBlobStore {
    client: Client,
    base_url: String,
    api_key: String,
    bucket: String,
}

impl SupabaseBlobStore {
    pub fn new(base_url: &str, api_key: &str, bucket: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::BlobUpload(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            bucket: bucket.to_string(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            urlencoding::encode(key)
        )
    }
}

#[async_trait]
impl BlobStore for SupabaseBlobStore {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<()> {
        let size = bytes.len();
        let response = self
            .client
            .post(self.object_url(key))
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header("content-type", content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|e| Error::BlobUpload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::BlobUpload(format!("HTTP {status}: {body}")));
        }

        debug!("Uploaded {} to bucket {} ({} bytes)", key, self.bucket, size);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.object_url(key))
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| Error::BlobDelete(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::BlobDelete(format!("HTTP {status}: {body}")));
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            urlencoding::encode(key)
        )
    }
}
