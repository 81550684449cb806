use thiserror::Error;
use uuid::Uuid;

/// Unified error type for book-translator-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Input validation (missing file, wrong extension)
/// - Book lookup and job state conflicts
/// - PDF text extraction
/// - Translation provider calls
/// - Blob and book storage
/// - Configuration loading
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Validation Errors
    // ==========================================================================
    /// Missing or malformed input
    #[error("{0}")]
    InvalidInput(String),

    /// Uploaded file is not a PDF
    #[error("only PDF files are accepted (got '{0}')")]
    NotPdf(String),

    // ==========================================================================
    // Book & Job Errors
    // ==========================================================================
    /// No book with the given id
    #[error("book not found: {0}")]
    BookNotFound(String),

    /// A translation job is already running for the book
    #[error("translation already in progress for book {0}")]
    JobAlreadyRunning(Uuid),

    /// The job worker is no longer accepting requests
    #[error("translation queue is closed")]
    QueueClosed,

    // ==========================================================================
    // PDF Errors
    // ==========================================================================
    /// Failed to open or parse a PDF file
    #[error("failed to open PDF: {0}")]
    PdfOpen(String),

    /// Failed to extract text from a PDF page
    #[error("failed to extract text from page {page}: {reason}")]
    PdfTextExtraction { page: u32, reason: String },

    // ==========================================================================
    // Translation Errors
    // ==========================================================================
    /// Translation API request failed
    #[error("translation API request failed: {0}")]
    TranslationRequest(String),

    /// Invalid response from translation API
    #[error("invalid translation API response: {0}")]
    TranslationInvalidResponse(String),

    /// Rate limited by translation API
    #[error("translation rate limited{}", retry_after.map(|s| format!(", retry after {s} seconds")).unwrap_or_default())]
    TranslationRateLimited { retry_after: Option<u64> },

    /// Translation request timed out
    #[error("translation request timed out")]
    TranslationTimeout,

    /// Maximum retry attempts exceeded for translation
    #[error("translation failed after maximum retries")]
    TranslationMaxRetriesExceeded,

    // ==========================================================================
    // Blob Storage Errors
    // ==========================================================================
    /// Failed to store the original PDF
    #[error("failed to upload file: {0}")]
    BlobUpload(String),

    /// Failed to remove a stored file
    #[error("failed to delete file: {0}")]
    BlobDelete(String),

    // ==========================================================================
    // Book Store Errors
    // ==========================================================================
    /// Failed to open the book store
    #[error("failed to initialize book store: {0}")]
    StoreInit(String),

    /// Failed to read from the book store
    #[error("failed to read from book store: {0}")]
    StoreRead(String),

    /// Failed to write to the book store
    #[error("failed to write to book store: {0}")]
    StoreWrite(String),

    /// A stored record could not be decoded
    #[error("corrupt record in book store: {0}")]
    StoreCorrupt(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing input
    Validation,
    /// Unknown book id
    NotFound,
    /// Job already running
    Conflict,
    /// Blob storage, extractor or translation provider fault
    Upstream,
    /// Anything else
    Internal,
}

impl Error {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) | Self::NotPdf(_) => ErrorKind::Validation,
            Self::BookNotFound(_) => ErrorKind::NotFound,
            Self::JobAlreadyRunning(_) => ErrorKind::Conflict,
            Self::PdfOpen(_)
            | Self::PdfTextExtraction { .. }
            | Self::TranslationRequest(_)
            | Self::TranslationInvalidResponse(_)
            | Self::TranslationRateLimited { .. }
            | Self::TranslationTimeout
            | Self::TranslationMaxRetriesExceeded
            | Self::BlobUpload(_)
            | Self::BlobDelete(_) => ErrorKind::Upstream,
            Self::QueueClosed
            | Self::StoreInit(_)
            | Self::StoreRead(_)
            | Self::StoreWrite(_)
            | Self::StoreCorrupt(_)
            | Self::ConfigLoad(_)
            | Self::ConfigInvalid { .. }
            | Self::Io(_) => ErrorKind::Internal,
        }
    }

    pub fn book_not_found(id: impl std::fmt::Display) -> Self {
        Self::BookNotFound(id.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
