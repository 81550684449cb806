//! Turning an uploaded PDF into a stored book.

use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::blob::{BlobStore, blob_key};
use crate::error::{Error, Result};
use crate::model::{BookStatus, NewBook};
use crate::pdf::PageExtractor;
use crate::store::BookStore;

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
    /// Display title; the file name without extension when absent or blank
    pub title: Option<String>,
}

/// What the client learns about a freshly ingested book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestedBook {
    pub id: Uuid,
    pub title: String,
    pub total_pages: usize,
    pub status: BookStatus,
}

fn is_pdf_name(file_name: &str) -> bool {
    std::path::Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn default_title(file_name: &str) -> String {
    let stem = if is_pdf_name(file_name) {
        &file_name[..file_name.len() - ".pdf".len()]
    } else {
        file_name
    };
    stem.to_string()
}

pub struct IngestionService {
    blobs: Arc<dyn BlobStore>,
    extractor: Arc<dyn PageExtractor>,
    store: Arc<dyn BookStore>,
}

impl IngestionService {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        extractor: Arc<dyn PageExtractor>,
        store: Arc<dyn BookStore>,
    ) -> Self {
        Self {
            blobs,
            extractor,
            store,
        }
    }

    /// Store the PDF, extract its pages and create a `pending` book.
    ///
    /// Nothing is persisted in the book store unless every step succeeds; the
    /// uploaded blob is removed again when a later step fails.
    pub async fn ingest(&self, upload: Upload) -> Result<IngestedBook> {
        if !is_pdf_name(&upload.file_name) {
            return Err(Error::NotPdf(upload.file_name));
        }

        let title = upload
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map_or_else(|| default_title(&upload.file_name), str::to_string);

        let key = blob_key(&upload.file_name);
        self.blobs
            .put(&key, upload.bytes.clone(), PDF_CONTENT_TYPE)
            .await?;
        let pdf_path = self.blobs.public_url(&key);

        match self.extract_and_create(title, pdf_path, upload.bytes).await {
            Ok(book) => {
                info!(
                    "Ingested '{}' as {} ({} pages)",
                    book.title, book.id, book.total_pages
                );
                Ok(book)
            }
            Err(e) => {
                warn!("Ingestion of {} failed: {}", upload.file_name, e);
                if let Err(cleanup) = self.blobs.delete(&key).await {
                    warn!("Failed to remove orphaned blob {}: {}", key, cleanup);
                }
                Err(e)
            }
        }
    }

    async fn extract_and_create(
        &self,
        title: String,
        pdf_path: String,
        bytes: Bytes,
    ) -> Result<IngestedBook> {
        let extractor = Arc::clone(&self.extractor);
        let extracted = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
            .await
            .map_err(|e| Error::PdfOpen(format!("extraction task failed: {e}")))??;

        let created = self
            .store
            .create_book(NewBook {
                title,
                pdf_path,
                pages: extracted.into_pages(),
            })
            .await?;

        Ok(IngestedBook {
            id: created.book.id,
            title: created.book.title,
            total_pages: created.book.total_pages,
            status: created.book.status,
        })
    }
}
