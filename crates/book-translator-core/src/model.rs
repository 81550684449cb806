//! Book and page records, and the read projections built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Translation lifecycle of a book.
///
/// `pending → translating → done | error`, and `error → translating` for a
/// re-run. A second `translating` while one is running is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Pending,
    Translating,
    Done,
    Error,
}

impl BookStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Translating => "translating",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    /// Whether a job may be started from this status
    pub const fn can_start_job(self) -> bool {
        !matches!(self, Self::Translating)
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded document and its translation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    /// Public URL of the stored original PDF
    pub pdf_path: String,
    /// Page count at ingestion; never changes
    pub total_pages: usize,
    pub status: BookStatus,
    pub created_at: DateTime<Utc>,
    /// Why the last job failed, if it did
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// One unit of extracted text in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: Uuid,
    pub book_id: Uuid,
    /// 1-based, unique within the book
    pub page_number: u32,
    pub original_text: String,
    /// Set once, never cleared or overwritten
    pub translated_text: Option<String>,
}

impl Page {
    pub const fn is_translated(&self) -> bool {
        self.translated_text.is_some()
    }
}

/// A book with all of its pages, ordered by page number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookWithPages {
    #[serde(flatten)]
    pub book: Book,
    pub pages: Vec<Page>,
}

impl BookWithPages {
    pub fn translated_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.is_translated()).count()
    }
}

/// Page text ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPage {
    pub page_number: u32,
    pub text: String,
}

/// Everything needed to create a book and its pages in one step.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub pdf_path: String,
    pub pages: Vec<NewPage>,
}

impl NewBook {
    /// Build the `pending` book and its untranslated pages.
    ///
    /// Pages are sorted by page number; `total_pages` is the page count.
    pub fn into_records(self) -> BookWithPages {
        let id = Uuid::new_v4();
        let mut pages: Vec<Page> = self
            .pages
            .into_iter()
            .map(|p| Page {
                id: Uuid::new_v4(),
                book_id: id,
                page_number: p.page_number,
                original_text: p.text,
                translated_text: None,
            })
            .collect();
        pages.sort_by_key(|p| p.page_number);

        BookWithPages {
            book: Book {
                id,
                title: self.title,
                pdf_path: self.pdf_path,
                total_pages: pages.len(),
                status: BookStatus::Pending,
                created_at: Utc::now(),
                error_message: None,
            },
            pages,
        }
    }
}

/// Percentage of translated pages, rounded half up; 0 for an empty book.
#[allow(clippy::cast_possible_truncation)] // percent <= 100
pub const fn progress_percent(translated_pages: usize, total_pages: usize) -> u8 {
    if total_pages == 0 {
        return 0;
    }
    let translated = if translated_pages > total_pages {
        total_pages
    } else {
        translated_pages
    };
    // round(t / n * 100) == (200t + n) / 2n for non-negative integers
    let percent = (translated * 200 + total_pages) / (total_pages * 2);
    percent as u8
}

/// A row of the book list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: Uuid,
    pub title: String,
    pub status: BookStatus,
    pub total_pages: usize,
    pub translated_pages: usize,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
}

impl BookSummary {
    pub fn new(book: Book, translated_pages: usize) -> Self {
        Self {
            progress: progress_percent(translated_pages, book.total_pages),
            id: book.id,
            status: book.status,
            total_pages: book.total_pages,
            translated_pages,
            created_at: book.created_at,
            title: book.title,
        }
    }
}

/// Point-in-time job status for polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationStatus {
    pub book_id: Uuid,
    pub status: BookStatus,
    pub total_pages: usize,
    pub translated_pages: usize,
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl TranslationStatus {
    pub fn new(book: &Book, translated_pages: usize) -> Self {
        Self {
            book_id: book.id,
            status: book.status,
            total_pages: book.total_pages,
            translated_pages,
            progress: progress_percent(translated_pages, book.total_pages),
            error_message: book.error_message.clone(),
        }
    }
}
