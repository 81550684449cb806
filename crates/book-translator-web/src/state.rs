use anyhow::{Context, Result};
use book_translator_core::{
    AppConfig, BlobStore, BookStore, IngestionService, JobRunner, JobWorker, MupdfExtractor,
    PageExtractor, TranslationClient, Translator, config::BlobBackend, create_blob_store,
    create_translator, job_queue, open_book_store,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Global application state
pub struct AppState {
    pub store: Arc<dyn BookStore>,
    pub ingestion: IngestionService,
    pub jobs: JobRunner,
    /// Interval between status checks of the progress stream
    pub status_poll: Duration,
    /// Directory served at `/files` when PDFs are stored locally
    pub files_dir: Option<PathBuf>,
    /// Request body limit for uploads
    pub max_upload_bytes: usize,
}

/// Capabilities the state is assembled from.
pub struct Services {
    pub store: Arc<dyn BookStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub extractor: Arc<dyn PageExtractor>,
    pub translator: Arc<dyn Translator>,
}

impl Services {
    /// Build the configured stores and provider.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            store: open_book_store(config).context("Failed to open book store")?,
            blobs: create_blob_store(config).context("Failed to open blob store")?,
            extractor: Arc::new(MupdfExtractor::new()),
            translator: create_translator(&config.translator)
                .context("Failed to create translator")?,
        })
    }
}

impl AppState {
    /// Wire the services together. The returned worker must be spawned for
    /// translation jobs to run.
    pub fn new(config: &AppConfig, services: Services) -> (Self, JobWorker) {
        let client = Arc::new(TranslationClient::new(
            services.translator,
            &config.translation,
        ));
        info!(
            "Translating {} -> {} with {}",
            config.source_lang,
            config.target_lang,
            client.provider_name()
        );

        let (jobs, worker) = job_queue(
            Arc::clone(&services.store),
            client,
            config.source_lang.clone(),
            config.target_lang.clone(),
        );

        let files_dir = (config.blob.backend == BlobBackend::Local).then(|| config.blob_dir());
        let ingestion = IngestionService::new(
            services.blobs,
            services.extractor,
            Arc::clone(&services.store),
        );

        let state = Self {
            store: services.store,
            ingestion,
            jobs,
            status_poll: Duration::from_millis(config.server.status_poll_ms),
            files_dir,
            max_upload_bytes: config.server.max_upload_mb * 1024 * 1024,
        };
        (state, worker)
    }
}
