//! Background translation jobs.
//!
//! `JobRunner` is the handle request handlers use: it claims the book by
//! moving it to `translating` and hands the id to the queue. `JobWorker`
//! drains the queue and runs each job on its own task. Pages within a job are
//! translated strictly one after another in page order, and every page is
//! stored before the next one starts.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Lang;
use crate::error::{Error, Result};
use crate::model::BookStatus;
use crate::store::{BookStore, PageUpdate};
use crate::translator::TranslationClient;

/// Status message stored on books whose job died with the process
pub const INTERRUPTED_MESSAGE: &str = "interrupted by server restart";

/// Returned to the caller once a job is queued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationStarted {
    pub message: String,
    pub book_id: Uuid,
}

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// All pages translated; `translated` counts pages written by this run
    Done { translated: usize },
    /// A page failed; the book is now `error`
    Failed(String),
    /// The book was deleted while the job ran
    Vanished,
}

#[derive(Debug)]
struct JobRequest {
    book_id: Uuid,
}

/// Create a connected runner/worker pair.
pub fn job_queue(
    store: Arc<dyn BookStore>,
    client: Arc<TranslationClient>,
    source: Lang,
    target: Lang,
) -> (JobRunner, JobWorker) {
    let (sender, receiver) = mpsc::unbounded_channel();

    let runner = JobRunner {
        store: Arc::clone(&store),
        sender,
    };
    let worker = JobWorker {
        pipeline: Arc::new(Pipeline {
            store,
            client,
            source,
            target,
        }),
        receiver,
    };

    (runner, worker)
}

#[derive(Clone)]
pub struct JobRunner {
    store: Arc<dyn BookStore>,
    sender: mpsc::UnboundedSender<JobRequest>,
}

impl JobRunner {
    /// Start translating a book and return without waiting for it.
    ///
    /// Fails with `BookNotFound` for an unknown id and `JobAlreadyRunning`
    /// while another job holds the book.
    pub async fn start(&self, book_id: Uuid) -> Result<TranslationStarted> {
        self.store.begin_translation(book_id).await?;

        if self.sender.send(JobRequest { book_id }).is_err() {
            error!("Job queue closed, cannot start book {}", book_id);
            self.store
                .set_status(
                    book_id,
                    BookStatus::Error,
                    Some(Error::QueueClosed.to_string()),
                )
                .await?;
            return Err(Error::QueueClosed);
        }

        info!("Queued translation of book {}", book_id);
        Ok(TranslationStarted {
            message: "Translation started".to_string(),
            book_id,
        })
    }

    /// Release books left in `translating` by a previous process.
    ///
    /// Call once at startup, before any job is started. Returns how many
    /// books were reset to `error`.
    pub async fn recover_interrupted(&self) -> Result<usize> {
        let mut recovered = 0;

        for book in self.store.list_books(None).await? {
            if book.status != BookStatus::Translating {
                continue;
            }
            if self
                .store
                .set_status(
                    book.id,
                    BookStatus::Error,
                    Some(INTERRUPTED_MESSAGE.to_string()),
                )
                .await?
            {
                warn!("Book {} ('{}') was interrupted, marked as error", book.id, book.title);
                recovered += 1;
            }
        }

        Ok(recovered)
    }
}

pub struct JobWorker {
    pipeline: Arc<Pipeline>,
    receiver: mpsc::UnboundedReceiver<JobRequest>,
}

impl JobWorker {
    /// Process queued jobs until every `JobRunner` is dropped.
    ///
    /// Each job runs on its own task so books are translated independently.
    pub async fn run(mut self) {
        while let Some(request) = self.receiver.recv().await {
            let pipeline = Arc::clone(&self.pipeline);
            tokio::spawn(async move {
                pipeline.run(request.book_id).await;
            });
        }
        debug!("Job queue closed, worker stopping");
    }

    /// Run one job to completion on the current task.
    pub async fn run_job(&self, book_id: Uuid) -> JobOutcome {
        self.pipeline.run(book_id).await
    }
}

struct Pipeline {
    store: Arc<dyn BookStore>,
    client: Arc<TranslationClient>,
    source: Lang,
    target: Lang,
}

impl Pipeline {
    async fn run(&self, book_id: Uuid) -> JobOutcome {
        match self.translate_pages(book_id).await {
            Ok(Some(translated)) => self.finish(book_id, translated).await,
            Ok(None) => {
                info!("Book {} was deleted, job stopped", book_id);
                JobOutcome::Vanished
            }
            Err(e) => self.fail(book_id, &e).await,
        }
    }

    /// Translate every untranslated page in order.
    ///
    /// `Ok(None)` means the book disappeared.
    async fn translate_pages(&self, book_id: Uuid) -> Result<Option<usize>> {
        let Some(book) = self.store.get_book(book_id).await? else {
            return Ok(None);
        };

        info!(
            "Translating '{}' ({} of {} pages done) with {}",
            book.book.title,
            book.translated_pages(),
            book.book.total_pages,
            self.client.provider_name()
        );

        let mut translated = 0;
        for page in &book.pages {
            if page.is_translated() {
                debug!("Page {} already translated, skipping", page.page_number);
                continue;
            }

            let text = self
                .client
                .translate(&page.original_text, &self.source, &self.target)
                .await
                .inspect_err(|e| {
                    error!("Failed to translate page {}: {}", page.page_number, e);
                })?;

            match self
                .store
                .set_page_translation(book_id, page.page_number, text)
                .await?
            {
                PageUpdate::Applied => {
                    translated += 1;
                    debug!(
                        "Page {}/{} translated",
                        page.page_number, book.book.total_pages
                    );
                }
                PageUpdate::AlreadyTranslated => {
                    debug!("Page {} was translated concurrently", page.page_number);
                }
                PageUpdate::Missing => return Ok(None),
            }
        }

        Ok(Some(translated))
    }

    async fn finish(&self, book_id: Uuid, translated: usize) -> JobOutcome {
        match self.store.set_status(book_id, BookStatus::Done, None).await {
            Ok(true) => {
                info!("Book {} done ({} pages translated)", book_id, translated);
                JobOutcome::Done { translated }
            }
            Ok(false) => JobOutcome::Vanished,
            Err(e) => self.fail(book_id, &e).await,
        }
    }

    async fn fail(&self, book_id: Uuid, cause: &Error) -> JobOutcome {
        let message = cause.to_string();
        error!("Translation of book {} failed: {}", book_id, message);

        match self
            .store
            .set_status(book_id, BookStatus::Error, Some(message.clone()))
            .await
        {
            Ok(true) => JobOutcome::Failed(message),
            Ok(false) => JobOutcome::Vanished,
            Err(e) => {
                error!("Failed to record error status for book {}: {}", book_id, e);
                JobOutcome::Failed(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewBook, NewPage};
    use crate::store::MemoryBookStore;
    use crate::translator::{Translator, TranslatorInfo};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Prefixes text with "TR:" and fails on the configured call number.
    #[derive(Default)]
    struct FakeTranslator {
        calls: Mutex<Vec<String>>,
        fail_on: Option<usize>,
    }

    #[async_trait]
    impl Translator for FakeTranslator {
        fn info(&self) -> TranslatorInfo {
            TranslatorInfo { name: "fake" }
        }

        async fn translate(&self, text: &str, _source: &Lang, _target: &Lang) -> Result<String> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(text.to_string());
            if self.fail_on == Some(calls.len()) {
                return Err(Error::TranslationRequest("provider down".to_string()));
            }
            Ok(format!("TR:{text}"))
        }
    }

    async fn setup(
        provider: Arc<FakeTranslator>,
        pages: &[&str],
    ) -> (Arc<MemoryBookStore>, JobRunner, JobWorker, Uuid) {
        let store = Arc::new(MemoryBookStore::new());
        let book = store
            .create_book(NewBook {
                title: "Test".to_string(),
                pdf_path: "/files/test.pdf".to_string(),
                pages: pages
                    .iter()
                    .enumerate()
                    .map(|(i, text)| NewPage {
                        page_number: u32::try_from(i + 1).unwrap(),
                        text: (*text).to_string(),
                    })
                    .collect(),
            })
            .await
            .unwrap();

        let client = Arc::new(TranslationClient::uncached(provider, 4000, Duration::ZERO));
        let (runner, worker) = job_queue(
            store.clone(),
            client,
            Lang::new("en"),
            Lang::new("tr"),
        );
        (store, runner, worker, book.book.id)
    }

    #[tokio::test]
    async fn test_translates_all_pages() {
        let provider = Arc::new(FakeTranslator::default());
        let (store, runner, worker, id) = setup(provider.clone(), &["Hello", "World"]).await;

        runner.start(id).await.unwrap();
        let outcome = worker.run_job(id).await;

        assert_eq!(outcome, JobOutcome::Done { translated: 2 });
        let book = store.get_book(id).await.unwrap().unwrap();
        assert_eq!(book.book.status, BookStatus::Done);
        assert_eq!(book.pages[0].translated_text.as_deref(), Some("TR:Hello"));
        assert_eq!(book.pages[1].translated_text.as_deref(), Some("TR:World"));
    }

    #[tokio::test]
    async fn test_failure_stops_and_records_error() {
        let provider = Arc::new(FakeTranslator {
            fail_on: Some(2),
            ..Default::default()
        });
        let (store, runner, worker, id) = setup(provider.clone(), &["a", "b", "c"]).await;

        runner.start(id).await.unwrap();
        let outcome = worker.run_job(id).await;

        assert!(matches!(outcome, JobOutcome::Failed(_)));
        assert_eq!(provider.calls.lock().unwrap().len(), 2);

        let status = store.translation_status(id).await.unwrap().unwrap();
        assert_eq!(status.status, BookStatus::Error);
        assert_eq!(status.translated_pages, 1);
        assert!(status.error_message.unwrap().contains("provider down"));
    }

    #[tokio::test]
    async fn test_rerun_only_fills_gaps() {
        let provider = Arc::new(FakeTranslator::default());
        let (store, runner, worker, id) = setup(provider.clone(), &["a", "b", "c"]).await;
        store.set_page_translation(id, 2, "kept".to_string()).await.unwrap();

        runner.start(id).await.unwrap();
        let outcome = worker.run_job(id).await;

        assert_eq!(outcome, JobOutcome::Done { translated: 2 });
        assert_eq!(*provider.calls.lock().unwrap(), vec!["a", "c"]);
        let book = store.get_book(id).await.unwrap().unwrap();
        assert_eq!(book.pages[1].translated_text.as_deref(), Some("kept"));
    }

    #[tokio::test]
    async fn test_start_rejects_running_and_unknown() {
        let provider = Arc::new(FakeTranslator::default());
        let (_store, runner, _worker, id) = setup(provider, &["a"]).await;

        runner.start(id).await.unwrap();
        assert!(matches!(runner.start(id).await, Err(Error::JobAlreadyRunning(_))));
        assert!(matches!(
            runner.start(Uuid::new_v4()).await,
            Err(Error::BookNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_closed_queue_reverts_to_error() {
        let provider = Arc::new(FakeTranslator::default());
        let (store, runner, worker, id) = setup(provider, &["a"]).await;
        drop(worker);

        assert!(matches!(runner.start(id).await, Err(Error::QueueClosed)));
        let status = store.translation_status(id).await.unwrap().unwrap();
        assert_eq!(status.status, BookStatus::Error);
    }

    #[tokio::test]
    async fn test_deleted_book_stops_quietly() {
        let provider = Arc::new(FakeTranslator::default());
        let (store, _runner, worker, id) = setup(provider.clone(), &["a"]).await;
        store.delete_book(id).await.unwrap();

        assert_eq!(worker.run_job(id).await, JobOutcome::Vanished);
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recover_interrupted() {
        let provider = Arc::new(FakeTranslator::default());
        let (store, runner, _worker, id) = setup(provider, &["a"]).await;
        store.begin_translation(id).await.unwrap();

        assert_eq!(runner.recover_interrupted().await.unwrap(), 1);
        let status = store.translation_status(id).await.unwrap().unwrap();
        assert_eq!(status.status, BookStatus::Error);
        assert_eq!(status.error_message.as_deref(), Some(INTERRUPTED_MESSAGE));

        // The book can be started again
        runner.start(id).await.unwrap();
    }

    #[tokio::test]
    async fn test_worker_runs_queued_jobs() {
        let provider = Arc::new(FakeTranslator::default());
        let (store, runner, worker, id) = setup(provider, &["a", "b"]).await;
        tokio::spawn(worker.run());

        runner.start(id).await.unwrap();

        let mut status = BookStatus::Translating;
        for _ in 0..100 {
            status = store.translation_status(id).await.unwrap().unwrap().status;
            if status != BookStatus::Translating {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(status, BookStatus::Done);
    }
}
