//! Upload route - PDF file ingestion.

use axum::{Json, extract::State};
use axum_extra::extract::{Multipart, multipart::MultipartRejection};
use book_translator_core::{IngestedBook, Upload};
use std::sync::Arc;
use tracing::info;

use crate::helpers::{ApiError, ApiResult, OptionExt, ResultExt};
use crate::state::AppState;

/// Upload a PDF (`file`, optional `title`) and create a pending book.
pub async fn upload_book(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<IngestedBook>> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.to_string()))?;

    let mut file = None;
    let mut title = None;

    while let Some(field) = multipart.next_field().await.or_bad_request()? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.or_bad_request()?;
                file = Some((file_name, bytes));
            }
            "title" => title = Some(field.text().await.or_bad_request()?),
            _ => {}
        }
    }

    let (file_name, bytes) = file.or_bad_request("No file uploaded")?;
    info!("Received upload {} ({} bytes)", file_name, bytes.len());

    let book = state
        .ingestion
        .ingest(Upload {
            file_name,
            bytes,
            title,
        })
        .await?;

    Ok(Json(book))
}
