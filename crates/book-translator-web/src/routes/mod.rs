//! HTTP route handlers for the book translator API.
//!
//! All routes live under `/api` and speak JSON; locally stored PDFs are
//! served under `/files`.

mod books;
mod stream;
mod translate;
mod upload;

pub use books::{delete_book, get_book, list_books};
pub use stream::translation_stream;
pub use translate::{start_translation, translation_status};
pub use upload::upload_book;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, header},
    routing::{get, post},
};
use book_translator_core::blob::FILES_ROUTE;
use serde::Deserialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir,
    set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

use crate::state::AppState;

/// Query params for the book list.
#[derive(Deserialize, Default)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: Option<String>,
}

/// `?id=` as used by book deletion.
#[derive(Deserialize, Default)]
pub struct IdQuery {
    #[serde(default)]
    pub id: Option<String>,
}

/// `?bookId=` as used by the status routes.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BookIdQuery {
    #[serde(default)]
    pub book_id: Option<String>,
}

/// JSON body of a translation start.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StartTranslationBody {
    #[serde(default)]
    pub book_id: Option<String>,
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/upload", post(upload_book))
        .route("/books", get(list_books).delete(delete_book))
        .route("/books/{id}", get(get_book))
        .route("/translate", post(start_translation).get(translation_status))
        .route("/translate/stream", get(translation_stream));

    let mut app = Router::new().nest("/api", api);

    // Original PDFs, cached but always revalidated
    if let Some(dir) = &state.files_dir {
        app = app.nest_service(
            FILES_ROUTE,
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-cache"),
                ))
                .service(ServeDir::new(dir)),
        );
    }

    app.layer(SetResponseHeaderLayer::if_not_present(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, max-age=0"),
    ))
    .layer(CompressionLayer::new())
    .layer(DefaultBodyLimit::max(state.max_upload_bytes))
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
    .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Services;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use book_translator_core::{
        AppConfig, ExtractedPage, ExtractedText, JobWorker, Lang, LocalBlobStore,
        MemoryBookStore, PageExtractor, Result, Translator, translator::TranslatorInfo,
    };
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct UppercaseTranslator;

    #[async_trait]
    impl Translator for UppercaseTranslator {
        fn info(&self) -> TranslatorInfo {
            TranslatorInfo { name: "uppercase" }
        }

        async fn translate(&self, text: &str, _source: &Lang, _target: &Lang) -> Result<String> {
            Ok(text.to_uppercase())
        }
    }

    struct TwoPages;

    impl PageExtractor for TwoPages {
        fn extract(&self, _bytes: &[u8]) -> Result<ExtractedText> {
            Ok(ExtractedText {
                pages: vec![
                    ExtractedPage {
                        page_number: 1,
                        text: "Hello".to_string(),
                    },
                    ExtractedPage {
                        page_number: 2,
                        text: "World".to_string(),
                    },
                ],
                full_text: "Hello\nWorld".to_string(),
            })
        }
    }

    struct TestApp {
        router: Router,
        state: Arc<AppState>,
        worker: Option<JobWorker>,
        _dir: TempDir,
    }

    impl TestApp {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let mut config = AppConfig::default();
            config.blob.dir = Some(dir.path().to_path_buf());
            config.translation.pacing_ms = 0;
            config.translation.cache_entries = 0;
            config.server.status_poll_ms = 10;

            let services = Services {
                store: Arc::new(MemoryBookStore::new()),
                blobs: Arc::new(LocalBlobStore::new(dir.path(), "").unwrap()),
                extractor: Arc::new(TwoPages),
                translator: Arc::new(UppercaseTranslator),
            };
            let (state, worker) = AppState::new(&config, services);
            let state = Arc::new(state);

            Self {
                router: router(Arc::clone(&state)),
                state,
                worker: Some(worker),
                _dir: dir,
            }
        }

        fn spawn_worker(&mut self) {
            if let Some(worker) = self.worker.take() {
                tokio::spawn(worker.run());
            }
        }

        async fn send(&self, request: Request<Body>) -> Response {
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn upload(&self) -> String {
            let response = self.send(multipart_upload("Sample Book.pdf", None)).await;
            assert_eq!(response.status(), StatusCode::OK);
            json_body(response).await["id"].as_str().unwrap().to_string()
        }
    }

    const BOUNDARY: &str = "book-translator-test-boundary";

    fn multipart_request(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, file_name, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            let disposition = match file_name {
                Some(file_name) => format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: application/pdf\r\n\r\n"
                ),
                None => format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"),
            };
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn multipart_upload(file_name: &str, title: Option<&str>) -> Request<Body> {
        let mut parts: Vec<(&str, Option<&str>, &[u8])> =
            vec![("file", Some(file_name), b"%PDF-1.7 test".as_slice())];
        if let Some(title) = title {
            parts.push(("title", None, title.as_bytes()));
        }
        multipart_request(&parts)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn delete(uri: &str) -> Request<Body> {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn text_body(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn assert_error(response: Response, status: StatusCode) {
        assert_eq!(response.status(), status);
        let body = json_body(response).await;
        assert!(body["error"].is_string(), "expected error body, got {body}");
    }

    #[tokio::test]
    async fn test_upload_creates_book() {
        let app = TestApp::new();

        let response = app.send(multipart_upload("Sample Book.pdf", Some("Dune"))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["title"], "Dune");
        assert_eq!(body["totalPages"], 2);
        assert_eq!(body["status"], "pending");
        assert!(body["id"].is_string());
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_input() {
        let app = TestApp::new();

        let not_pdf = app.send(multipart_upload("notes.txt", None)).await;
        assert_error(not_pdf, StatusCode::BAD_REQUEST).await;

        let no_file = app
            .send(multipart_request(&[("title", None, b"Only a title".as_slice())]))
            .await;
        assert_error(no_file, StatusCode::BAD_REQUEST).await;

        let not_multipart = app.send(post_json("/api/upload", "{}")).await;
        assert_error(not_multipart, StatusCode::BAD_REQUEST).await;
    }

    #[tokio::test]
    async fn test_list_and_detail() {
        let app = TestApp::new();
        let id = app.upload().await;

        let response = app.send(get("/api/books")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-store, max-age=0"
        );
        let list = json_body(response).await;
        assert_eq!(list[0]["id"], id.as_str());
        assert_eq!(list[0]["title"], "Sample Book");
        assert_eq!(list[0]["translatedPages"], 0);
        assert_eq!(list[0]["progress"], 0);

        let filtered = json_body(app.send(get("/api/books?search=Nothing")).await).await;
        assert_eq!(filtered.as_array().unwrap().len(), 0);

        let detail = json_body(app.send(get(&format!("/api/books/{id}"))).await).await;
        assert_eq!(detail["pages"][0]["pageNumber"], 1);
        assert_eq!(detail["pages"][1]["originalText"], "World");
        assert!(detail["pages"][1]["translatedText"].is_null());
        assert!(detail["pdfPath"].as_str().unwrap().starts_with("/files/"));

        let missing = app.send(get(&format!("/api/books/{}", uuid::Uuid::new_v4()))).await;
        assert_error(missing, StatusCode::NOT_FOUND).await;
        let garbage = app.send(get("/api/books/not-a-uuid")).await;
        assert_error(garbage, StatusCode::NOT_FOUND).await;
    }

    #[tokio::test]
    async fn test_uploaded_pdf_is_served() {
        let app = TestApp::new();
        let id = app.upload().await;

        let detail = json_body(app.send(get(&format!("/api/books/{id}"))).await).await;
        let pdf_path = detail["pdfPath"].as_str().unwrap().to_string();

        let response = app.send(get(&pdf_path)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text_body(response).await, "%PDF-1.7 test");
    }

    #[tokio::test]
    async fn test_start_translation_errors() {
        let app = TestApp::new();
        let id = app.upload().await;

        let missing = app.send(post_json("/api/translate", "{}")).await;
        assert_error(missing, StatusCode::BAD_REQUEST).await;

        let malformed = app.send(post_json("/api/translate", "{not json")).await;
        assert_error(malformed, StatusCode::BAD_REQUEST).await;

        let unknown = app
            .send(post_json(
                "/api/translate",
                &format!(r#"{{"bookId":"{}"}}"#, uuid::Uuid::new_v4()),
            ))
            .await;
        assert_error(unknown, StatusCode::NOT_FOUND).await;

        // Worker not running: the first start claims the book, the second is rejected
        let body = format!(r#"{{"bookId":"{id}"}}"#);
        let first = app.send(post_json("/api/translate", &body)).await;
        assert_eq!(first.status(), StatusCode::OK);
        let started = json_body(first).await;
        assert_eq!(started["message"], "Translation started");
        assert_eq!(started["bookId"], id.as_str());

        let second = app.send(post_json("/api/translate", &body)).await;
        assert_error(second, StatusCode::BAD_REQUEST).await;

        let status =
            json_body(app.send(get(&format!("/api/translate?bookId={id}"))).await).await;
        assert_eq!(status["status"], "translating");
        assert!(app.worker.is_some());
    }

    #[tokio::test]
    async fn test_translation_runs_to_done() {
        let mut app = TestApp::new();
        app.spawn_worker();
        let id = app.upload().await;

        let response = app
            .send(post_json("/api/translate", &format!(r#"{{"bookId":"{id}"}}"#)))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let mut status = Value::Null;
        for _ in 0..200 {
            status = json_body(app.send(get(&format!("/api/translate?bookId={id}"))).await).await;
            if status["status"] != "translating" {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        assert_eq!(status["status"], "done");
        assert_eq!(status["totalPages"], 2);
        assert_eq!(status["translatedPages"], 2);
        assert_eq!(status["progress"], 100);

        let detail = json_body(app.send(get(&format!("/api/books/{id}"))).await).await;
        assert_eq!(detail["pages"][0]["translatedText"], "HELLO");
        assert_eq!(detail["pages"][1]["translatedText"], "WORLD");
    }

    #[tokio::test]
    async fn test_status_errors() {
        let app = TestApp::new();

        assert_error(app.send(get("/api/translate")).await, StatusCode::BAD_REQUEST).await;
        assert_error(
            app.send(get("/api/translate?bookId=")).await,
            StatusCode::BAD_REQUEST,
        )
        .await;
        assert_error(
            app.send(get(&format!("/api/translate?bookId={}", uuid::Uuid::new_v4())))
                .await,
            StatusCode::NOT_FOUND,
        )
        .await;
        assert_error(
            app.send(get("/api/translate/stream")).await,
            StatusCode::BAD_REQUEST,
        )
        .await;
    }

    #[tokio::test]
    async fn test_progress_stream_ends_when_done() {
        let mut app = TestApp::new();
        app.spawn_worker();
        let id = app.upload().await;
        app.state.jobs.start(id.parse().unwrap()).await.unwrap();

        let response = app
            .send(get(&format!("/api/translate/stream?bookId={id}")))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = text_body(response).await;
        assert!(body.contains("event: progress"));
        assert!(body.contains(r#""status":"done""#));
        assert!(body.contains(r#""progress":100"#));
    }

    #[tokio::test]
    async fn test_delete() {
        let app = TestApp::new();
        let id = app.upload().await;

        assert_error(app.send(delete("/api/books")).await, StatusCode::BAD_REQUEST).await;
        assert_error(
            app.send(delete(&format!("/api/books?id={}", uuid::Uuid::new_v4())))
                .await,
            StatusCode::NOT_FOUND,
        )
        .await;

        let response = app.send(delete(&format!("/api/books?id={id}"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["message"], "Book deleted");

        let gone = app.send(get(&format!("/api/books/{id}"))).await;
        assert_error(gone, StatusCode::NOT_FOUND).await;
    }
}
