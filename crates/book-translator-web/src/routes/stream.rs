//! Server-sent progress updates for a running translation.

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use book_translator_core::{BookStatus, TranslationStatus};
use futures::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{error, warn};

use super::BookIdQuery;
use super::translate::BOOK_ID_REQUIRED;
use crate::helpers::{ApiResult, BOOK_NOT_FOUND, OptionExt, required_book_id};
use crate::state::AppState;

/// SSE stream of `progress` events.
///
/// An event is sent whenever the status changes. The stream ends after the
/// first status that is no longer `translating`, or when the book disappears.
#[allow(tail_expr_drop_order)] // Drop order change in async_stream macro is harmless here
pub async fn translation_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookIdQuery>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let id = required_book_id(query.book_id.as_deref(), BOOK_ID_REQUIRED)?;
    let initial = state
        .store
        .translation_status(id)
        .await?
        .or_not_found(BOOK_NOT_FOUND)?;

    let store = Arc::clone(&state.store);
    let poll = state.status_poll;

    let stream = async_stream::stream! {
        let mut current = Some(initial);
        let mut last: Option<TranslationStatus> = None;

        while let Some(status) = current.take() {
            if last.as_ref() != Some(&status) {
                match Event::default().event("progress").json_data(&status) {
                    Ok(event) => yield Ok(event),
                    Err(e) => {
                        error!("Failed to encode progress event: {}", e);
                        break;
                    }
                }
            }

            if status.status != BookStatus::Translating {
                break;
            }
            last = Some(status);

            tokio::time::sleep(poll).await;
            current = match store.translation_status(id).await {
                Ok(next) => next,
                Err(e) => {
                    warn!("Progress stream for {} stopped: {}", id, e);
                    None
                }
            };
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
