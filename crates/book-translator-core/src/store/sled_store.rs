//! Book store backed by an embedded sled database.
//!
//! Two trees:
//! - `books`: book uuid (16 bytes) → JSON `Book`
//! - `pages`: book uuid ‖ page number (big-endian u32) → JSON `Page`
//!
//! Big-endian page numbers make a prefix scan over a book's uuid return its
//! pages in reading order. Single-record updates are compare-and-swap loops,
//! create and delete are transactions over both trees, and every write is
//! flushed before the call returns.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sled::transaction::TransactionResult;
use sled::{Db, IVec, Transactional, Tree};
use std::convert::Infallible;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

use super::{BookStore, PageUpdate, title_matches};
use crate::error::{Error, Result};
use crate::model::{
    Book, BookStatus, BookSummary, BookWithPages, NewBook, Page, TranslationStatus,
};

type PageKey = [u8; 20];

fn page_key(book_id: Uuid, page_number: u32) -> PageKey {
    let mut key = [0u8; 20];
    key[..16].copy_from_slice(book_id.as_bytes());
    key[16..].copy_from_slice(&page_number.to_be_bytes());
    key
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| Error::StoreWrite(format!("encode failed: {e}")))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| Error::StoreCorrupt(e.to_string()))
}

fn read_err(e: sled::Error) -> Error {
    Error::StoreRead(e.to_string())
}

fn write_err(e: sled::Error) -> Error {
    Error::StoreWrite(e.to_string())
}

pub struct SledBookStore {
    db: Db,
    books: Tree,
    pages: Tree,
}

impl SledBookStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::StoreInit(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let db = sled::open(path).map_err(|e| {
            let err_str = e.to_string();
            // Detect lock errors and provide actionable fix
            if err_str.contains("WouldBlock") || err_str.contains("lock") {
                Error::StoreInit(format!(
                    "Database locked at {}\n\n\
                    Another server instance is using it, or a previous instance crashed.\n\
                    To fix: stop the other instance or rm {}/db/LOCK",
                    path.display(),
                    path.display()
                ))
            } else {
                Error::StoreInit(format!("Failed to open database at {}: {}", path.display(), e))
            }
        })?;

        let books = db
            .open_tree("books")
            .map_err(|e| Error::StoreInit(e.to_string()))?;
        let pages = db
            .open_tree("pages")
            .map_err(|e| Error::StoreInit(e.to_string()))?;

        debug!(
            "Opened book store at {} ({} books)",
            path.display(),
            books.len()
        );

        Ok(Self { db, books, pages })
    }

    async fn flush(&self) -> Result<()> {
        self.db
            .flush_async()
            .await
            .map_err(|e| Error::StoreWrite(format!("Flush failed: {e}")))?;
        Ok(())
    }

    fn load_pages(&self, book_id: Uuid) -> Result<Vec<Page>> {
        self.pages
            .scan_prefix(book_id.as_bytes())
            .values()
            .map(|value| decode(&value.map_err(read_err)?))
            .collect()
    }

    fn count_translated(&self, book_id: Uuid) -> Result<usize> {
        let mut count = 0;
        for page in self.load_pages(book_id)? {
            if page.is_translated() {
                count += 1;
            }
        }
        Ok(count)
    }

    fn load_book(&self, id: Uuid) -> Result<Option<Book>> {
        self.books
            .get(id.as_bytes())
            .map_err(read_err)?
            .map(|value| decode(&value))
            .transpose()
    }

    /// Read-modify-write of one book record.
    ///
    /// `update` sees the current book and returns the replacement, or an
    /// error to leave the record untouched. Returns `None` if the book does
    /// not exist.
    fn update_book<F>(&self, id: Uuid, mut update: F) -> Result<Option<Book>>
    where
        F: FnMut(Book) -> Result<Book>,
    {
        loop {
            let Some(current) = self.books.get(id.as_bytes()).map_err(read_err)? else {
                return Ok(None);
            };

            let updated = update(decode(&current)?)?;
            let bytes = encode(&updated)?;

            if self
                .books
                .compare_and_swap(id.as_bytes(), Some(&current), Some(bytes))
                .map_err(write_err)?
                .is_ok()
            {
                return Ok(Some(updated));
            }
            debug!("Book {} changed concurrently, retrying update", id);
        }
    }
}

#[async_trait]
impl BookStore for SledBookStore {
    async fn create_book(&self, book: NewBook) -> Result<BookWithPages> {
        let record = book.into_records();
        let book_value = encode(&record.book)?;
        let page_entries = record
            .pages
            .iter()
            .map(|p| Ok((page_key(p.book_id, p.page_number), encode(p)?)))
            .collect::<Result<Vec<(PageKey, Vec<u8>)>>>()?;

        let result: TransactionResult<(), Infallible> =
            (&self.books, &self.pages).transaction(|(books, pages)| {
                books.insert(&record.book.id.as_bytes()[..], book_value.as_slice())?;
                for (key, value) in &page_entries {
                    pages.insert(&key[..], value.as_slice())?;
                }
                Ok(())
            });
        result.map_err(|e| Error::StoreWrite(e.to_string()))?;
        self.flush().await?;

        Ok(record)
    }

    async fn get_book(&self, id: Uuid) -> Result<Option<BookWithPages>> {
        let Some(book) = self.load_book(id)? else {
            return Ok(None);
        };
        let pages = self.load_pages(id)?;
        Ok(Some(BookWithPages { book, pages }))
    }

    async fn list_books(&self, search: Option<&str>) -> Result<Vec<BookSummary>> {
        let mut summaries = Vec::new();

        for value in self.books.iter().values() {
            let book: Book = decode(&value.map_err(read_err)?)?;
            if !title_matches(&book.title, search) {
                continue;
            }
            let translated = self.count_translated(book.id)?;
            summaries.push(BookSummary::new(book, translated));
        }

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn delete_book(&self, id: Uuid) -> Result<bool> {
        let page_keys = self
            .pages
            .scan_prefix(id.as_bytes())
            .keys()
            .collect::<std::result::Result<Vec<IVec>, sled::Error>>()
            .map_err(read_err)?;

        let result: TransactionResult<bool, Infallible> =
            (&self.books, &self.pages).transaction(|(books, pages)| {
                let existed = books.remove(&id.as_bytes()[..])?.is_some();
                for key in &page_keys {
                    pages.remove(key.clone())?;
                }
                Ok(existed)
            });
        let existed = result.map_err(|e| Error::StoreWrite(e.to_string()))?;
        self.flush().await?;

        debug!("Deleted book {} ({} pages)", id, page_keys.len());
        Ok(existed)
    }

    async fn translation_status(&self, id: Uuid) -> Result<Option<TranslationStatus>> {
        let Some(book) = self.load_book(id)? else {
            return Ok(None);
        };
        let translated = self.count_translated(id)?;
        Ok(Some(TranslationStatus::new(&book, translated)))
    }

    async fn set_page_translation(
        &self,
        book_id: Uuid,
        page_number: u32,
        text: String,
    ) -> Result<PageUpdate> {
        let key = page_key(book_id, page_number);

        loop {
            let Some(current) = self.pages.get(key).map_err(read_err)? else {
                return Ok(PageUpdate::Missing);
            };

            let mut page: Page = decode(&current)?;
            if page.is_translated() {
                return Ok(PageUpdate::AlreadyTranslated);
            }
            page.translated_text = Some(text.clone());
            let bytes = encode(&page)?;

            if self
                .pages
                .compare_and_swap(key, Some(&current), Some(bytes))
                .map_err(write_err)?
                .is_ok()
            {
                self.flush().await?;
                return Ok(PageUpdate::Applied);
            }
        }
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: BookStatus,
        error_message: Option<String>,
    ) -> Result<bool> {
        let updated = self.update_book(id, |mut book| {
            book.status = status;
            book.error_message.clone_from(&error_message);
            Ok(book)
        })?;

        if updated.is_some() {
            self.flush().await?;
        }
        Ok(updated.is_some())
    }

    async fn begin_translation(&self, id: Uuid) -> Result<Book> {
        let updated = self.update_book(id, |mut book| {
            if !book.status.can_start_job() {
                return Err(Error::JobAlreadyRunning(id));
            }
            book.status = BookStatus::Translating;
            book.error_message = None;
            Ok(book)
        })?;

        let book = updated.ok_or_else(|| Error::book_not_found(id))?;
        self.flush().await?;
        Ok(book)
    }
}
