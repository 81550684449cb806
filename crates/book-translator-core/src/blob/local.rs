use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use super::BlobStore;
use crate::error::{Error, Result};

/// Route prefix under which the web server exposes the blob directory
pub const FILES_ROUTE: &str = "/files";

/// PDFs kept in a local directory and served by the web server.
pub struct LocalBlobStore {
    dir: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::BlobUpload(format!("Failed to create blob directory {}: {}", dir.display(), e))
        })?;
        Ok(Self {
            dir,
            public_base_url: public_base_url.into(),
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        // Keys are produced by `blob_key`; refuse anything that could escape the directory
        if key.is_empty() || key.contains('/') || key.contains('\\') || key.starts_with('.') {
            return Err(Error::InvalidInput(format!("invalid blob key '{key}'")));
        }
        Ok(self.dir.join(key))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn put(&self, key: &str, bytes: Bytes, _content_type: &str) -> Result<()> {
        let path = self.path_for(key)?;

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| Error::BlobUpload(format!("{}: {}", path.display(), e)))?;
        write_or_remove(&path, file, &bytes).await?;

        debug!("Stored {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| Error::BlobDelete(format!("{}: {}", path.display(), e)))
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}{}/{}",
            self.public_base_url.trim_end_matches('/'),
            FILES_ROUTE,
            urlencoding::encode(key)
        )
    }
}

/// Write `bytes` to the freshly created file at `path`, removing the file if
/// the write does not complete so the key can be stored again.
async fn write_or_remove<W>(path: &Path, mut file: W, bytes: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = match file.write_all(bytes).await {
        Ok(()) => file.flush().await,
        Err(e) => Err(e),
    };
    drop(file);

    if let Err(e) = written {
        if let Err(remove_err) = tokio::fs::remove_file(path).await {
            warn!("Failed to remove partial blob {}: {}", path.display(), remove_err);
        }
        return Err(Error::BlobUpload(format!("{}: {}", path.display(), e)));
    }
    Ok(())
}
