use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BookStore, PageUpdate, title_matches};
use crate::error::{Error, Result};
use crate::model::{Book, BookStatus, BookSummary, BookWithPages, NewBook, TranslationStatus};

/// Book store held in process memory.
///
/// Every operation runs inside a single lock acquisition, which makes each
/// one atomic. Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryBookStore {
    books: RwLock<HashMap<Uuid, BookWithPages>>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn create_book(&self, book: NewBook) -> Result<BookWithPages> {
        let record = book.into_records();
        self.books
            .write()
            .await
            .insert(record.book.id, record.clone());
        Ok(record)
    }

    async fn get_book(&self, id: Uuid) -> Result<Option<BookWithPages>> {
        Ok(self.books.read().await.get(&id).cloned())
    }

    async fn list_books(&self, search: Option<&str>) -> Result<Vec<BookSummary>> {
        let books = self.books.read().await;
        let mut summaries: Vec<BookSummary> = books
            .values()
            .filter(|b| title_matches(&b.book.title, search))
            .map(|b| BookSummary::new(b.book.clone(), b.translated_pages()))
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn delete_book(&self, id: Uuid) -> Result<bool> {
        Ok(self.books.write().await.remove(&id).is_some())
    }

    async fn translation_status(&self, id: Uuid) -> Result<Option<TranslationStatus>> {
        Ok(self
            .books
            .read()
            .await
            .get(&id)
            .map(|b| TranslationStatus::new(&b.book, b.translated_pages())))
    }

    async fn set_page_translation(
        &self,
        book_id: Uuid,
        page_number: u32,
        text: String,
    ) -> Result<PageUpdate> {
        let mut books = self.books.write().await;
        let Some(page) = books
            .get_mut(&book_id)
            .and_then(|b| b.pages.iter_mut().find(|p| p.page_number == page_number))
        else {
            return Ok(PageUpdate::Missing);
        };

        if page.is_translated() {
            return Ok(PageUpdate::AlreadyTranslated);
        }
        page.translated_text = Some(text);
        Ok(PageUpdate::Applied)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: BookStatus,
        error_message: Option<String>,
    ) -> Result<bool> {
        let mut books = self.books.write().await;
        let Some(record) = books.get_mut(&id) else {
            return Ok(false);
        };
        record.book.status = status;
        record.book.error_message = error_message;
        Ok(true)
    }

    async fn begin_translation(&self, id: Uuid) -> Result<Book> {
        let mut books = self.books.write().await;
        let record = books.get_mut(&id).ok_or_else(|| Error::book_not_found(id))?;

        if !record.book.status.can_start_job() {
            return Err(Error::JobAlreadyRunning(id));
        }
        record.book.status = BookStatus::Translating;
        record.book.error_message = None;
        Ok(record.book.clone())
    }
}
