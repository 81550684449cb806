//! Persistence of books and pages.
//!
//! Every operation is applied atomically on its own: creating a book writes the
//! book and all of its pages together, each page update and each status change
//! is an independent single-record write. There is no transaction spanning a
//! page update and a status change.

mod memory;
mod sled_store;

pub use memory::MemoryBookStore;
pub use sled_store::SledBookStore;

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{AppConfig, StorageBackend};
use crate::error::Result;
use crate::model::{Book, BookStatus, BookSummary, BookWithPages, NewBook, TranslationStatus};

/// Outcome of writing a page translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageUpdate {
    /// The page was untranslated and now holds the text
    Applied,
    /// The page already had a translation; nothing was written
    AlreadyTranslated,
    /// The page (or its book) no longer exists
    Missing,
}

#[async_trait]
pub trait BookStore: Send + Sync {
    /// Persist a new `pending` book together with all of its pages.
    async fn create_book(&self, book: NewBook) -> Result<BookWithPages>;

    /// Load a book with its pages ordered by page number.
    async fn get_book(&self, id: Uuid) -> Result<Option<BookWithPages>>;

    /// All books, newest first, optionally filtered by a case-sensitive
    /// substring of the title.
    async fn list_books(&self, search: Option<&str>) -> Result<Vec<BookSummary>>;

    /// Remove a book and its pages. Returns whether the book existed.
    async fn delete_book(&self, id: Uuid) -> Result<bool>;

    /// Current status and translated page count.
    async fn translation_status(&self, id: Uuid) -> Result<Option<TranslationStatus>>;

    /// Store a page translation unless the page already has one.
    async fn set_page_translation(
        &self,
        book_id: Uuid,
        page_number: u32,
        text: String,
    ) -> Result<PageUpdate>;

    /// Overwrite the book status. Returns `false` if the book no longer exists.
    async fn set_status(
        &self,
        id: Uuid,
        status: BookStatus,
        error_message: Option<String>,
    ) -> Result<bool>;

    /// Atomically move the book to `translating` unless it already is.
    ///
    /// Fails with `BookNotFound` or `JobAlreadyRunning`. On success the last
    /// error message is cleared and the updated book is returned.
    async fn begin_translation(&self, id: Uuid) -> Result<Book>;
}

/// Open the configured book store
pub fn open_book_store(config: &AppConfig) -> Result<Arc<dyn BookStore>> {
    let store: Arc<dyn BookStore> = match config.storage.backend {
        StorageBackend::Memory => Arc::new(MemoryBookStore::new()),
        StorageBackend::Sled => Arc::new(SledBookStore::open(config.storage_path())?),
    };
    Ok(store)
}

/// Case-sensitive title filter shared by the implementations.
fn title_matches(title: &str, search: Option<&str>) -> bool {
    search.is_none_or(|needle| needle.is_empty() || title.contains(needle))
}

/// Shared behaviour checks run against every implementation.
#[cfg(test)]
pub(crate) mod contract {
    use super::*;
    use crate::error::Error;
    use crate::model::NewPage;

    pub fn new_book(title: &str, pages: &[&str]) -> NewBook {
        NewBook {
            title: title.to_string(),
            pdf_path: format!("/files/{title}.pdf"),
            pages: pages
                .iter()
                .enumerate()
                .map(|(i, text)| NewPage {
                    page_number: u32::try_from(i + 1).unwrap(),
                    text: (*text).to_string(),
                })
                .collect(),
        }
    }

    pub async fn create_and_get(store: &dyn BookStore) {
        let created = store
            .create_book(new_book("Hello", &["Hello", "World", "End"]))
            .await
            .unwrap();
        let loaded = store.get_book(created.book.id).await.unwrap().unwrap();

        assert_eq!(loaded, created);
        assert_eq!(loaded.book.total_pages, 3);
        assert_eq!(loaded.book.status, BookStatus::Pending);
        let numbers: Vec<u32> = loaded.pages.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(store.get_book(Uuid::new_v4()).await.unwrap().is_none());
    }

    pub async fn page_translation_is_write_once(store: &dyn BookStore) {
        let created = store.create_book(new_book("Once", &["a", "b"])).await.unwrap();
        let id = created.book.id;

        let first = store.set_page_translation(id, 1, "A".to_string()).await.unwrap();
        let second = store.set_page_translation(id, 1, "X".to_string()).await.unwrap();
        let missing = store.set_page_translation(id, 9, "Z".to_string()).await.unwrap();

        assert_eq!(first, PageUpdate::Applied);
        assert_eq!(second, PageUpdate::AlreadyTranslated);
        assert_eq!(missing, PageUpdate::Missing);

        let loaded = store.get_book(id).await.unwrap().unwrap();
        assert_eq!(loaded.pages[0].translated_text.as_deref(), Some("A"));
        assert_eq!(loaded.pages[1].translated_text, None);

        let status = store.translation_status(id).await.unwrap().unwrap();
        assert_eq!(status.translated_pages, 1);
        assert_eq!(status.progress, 50);
    }

    pub async fn begin_translation_guards(store: &dyn BookStore) {
        let created = store.create_book(new_book("Guard", &["a"])).await.unwrap();
        let id = created.book.id;

        store.set_status(id, BookStatus::Error, Some("boom".to_string())).await.unwrap();
        let started = store.begin_translation(id).await.unwrap();
        assert_eq!(started.status, BookStatus::Translating);
        assert_eq!(started.error_message, None);

        let again = store.begin_translation(id).await;
        assert!(matches!(again, Err(Error::JobAlreadyRunning(got)) if got == id));

        let unknown = store.begin_translation(Uuid::new_v4()).await;
        assert!(matches!(unknown, Err(Error::BookNotFound(_))));
    }

    pub async fn list_filters_and_orders(store: &dyn BookStore) {
        let older = store.create_book(new_book("Rust in Action", &["a", "b"])).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let newer = store.create_book(new_book("Rusty Nails", &["a"])).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.create_book(new_book("Go Programming", &["a"])).await.unwrap();

        store.set_page_translation(older.book.id, 1, "x".to_string()).await.unwrap();

        let all = store.list_books(None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].title, "Go Programming");

        let rust = store.list_books(Some("Rust")).await.unwrap();
        let titles: Vec<&str> = rust.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Rusty Nails", "Rust in Action"]);
        assert_eq!(rust[0].id, newer.book.id);
        assert_eq!(rust[1].translated_pages, 1);
        assert_eq!(rust[1].progress, 50);

        // Case-sensitive
        assert!(store.list_books(Some("rust")).await.unwrap().is_empty());
        assert_eq!(store.list_books(Some("")).await.unwrap().len(), 3);
    }

    pub async fn delete_cascades(store: &dyn BookStore) {
        let keep = store.create_book(new_book("Keep", &["k"])).await.unwrap();
        let gone = store.create_book(new_book("Gone", &["a", "b"])).await.unwrap();

        assert!(store.delete_book(gone.book.id).await.unwrap());
        assert!(!store.delete_book(gone.book.id).await.unwrap());

        assert!(store.get_book(gone.book.id).await.unwrap().is_none());
        assert!(store.translation_status(gone.book.id).await.unwrap().is_none());
        assert_eq!(
            store.set_page_translation(gone.book.id, 1, "x".to_string()).await.unwrap(),
            PageUpdate::Missing
        );
        assert!(!store.set_status(gone.book.id, BookStatus::Done, None).await.unwrap());
        assert!(store.get_book(keep.book.id).await.unwrap().is_some());
    }
}
