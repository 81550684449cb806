//! Translation job start and status polling.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
};
use book_translator_core::{TranslationStarted, TranslationStatus};
use std::sync::Arc;

use super::{BookIdQuery, StartTranslationBody};
use crate::helpers::{ApiError, ApiResult, BOOK_NOT_FOUND, OptionExt, required_book_id};
use crate::state::AppState;

pub const BOOK_ID_REQUIRED: &str = "bookId is required";

/// Queue a translation job and return immediately.
pub async fn start_translation(
    State(state): State<Arc<AppState>>,
    body: Result<Json<StartTranslationBody>, JsonRejection>,
) -> ApiResult<Json<TranslationStarted>> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.to_string()))?;
    let id = required_book_id(body.book_id.as_deref(), BOOK_ID_REQUIRED)?;

    let started = state.jobs.start(id).await?;
    Ok(Json(started))
}

/// Current job status and progress of a book.
pub async fn translation_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookIdQuery>,
) -> ApiResult<Json<TranslationStatus>> {
    let id = required_book_id(query.book_id.as_deref(), BOOK_ID_REQUIRED)?;
    let status = state
        .store
        .translation_status(id)
        .await?
        .or_not_found(BOOK_NOT_FOUND)?;
    Ok(Json(status))
}
