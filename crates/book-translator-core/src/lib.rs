//! Book Translator Core Library
//!
//! This library provides the core functionality for translating uploaded books:
//! - PDF page text extraction
//! - Paragraph chunking and paced translation through pluggable providers
//! - Book and page persistence (memory or sled)
//! - Blob storage for the original PDFs
//! - A background job queue that translates books page by page

pub mod blob;
pub mod cache;
pub mod chunker;
pub mod config;
pub mod error;
pub mod ingest;
pub mod job;
pub mod model;
pub mod pdf;
pub mod store;
pub mod translator;
pub mod util;

pub use blob::{BlobStore, LocalBlobStore, SupabaseBlobStore, blob_key, create_blob_store};
pub use cache::{CacheKey, TranslationCache};
pub use chunker::split_into_chunks;
pub use config::{
    AppConfig, DEFAULT_SOURCE_LANG, DEFAULT_TARGET_LANG, Lang, ProviderKind, TranslatorConfig,
};
pub use error::{Error, ErrorKind, Result};
pub use ingest::{IngestedBook, IngestionService, Upload};
pub use job::{JobOutcome, JobRunner, JobWorker, TranslationStarted, job_queue};
pub use model::{
    Book, BookStatus, BookSummary, BookWithPages, NewBook, NewPage, Page, TranslationStatus,
    progress_percent,
};
pub use pdf::{ExtractedPage, ExtractedText, MupdfExtractor, PageExtractor};
pub use store::{BookStore, MemoryBookStore, PageUpdate, SledBookStore, open_book_store};
pub use translator::{TranslationClient, Translator, create_translator};
