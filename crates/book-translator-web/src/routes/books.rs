//! Book listing, detail and deletion.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use book_translator_core::{BookSummary, BookWithPages};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use super::{IdQuery, SearchQuery};
use crate::helpers::{ApiResult, BOOK_NOT_FOUND, OptionExt, parse_book_id, required_book_id};
use crate::state::AppState;

/// All books with progress, newest first.
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<BookSummary>>> {
    let books = state.store.list_books(query.search.as_deref()).await?;
    Ok(Json(books))
}

/// One book with its ordered pages.
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<BookWithPages>> {
    let id = parse_book_id(&id)?;
    let book = state.store.get_book(id).await?.or_not_found(BOOK_NOT_FOUND)?;
    Ok(Json(book))
}

pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<Value>> {
    let id = required_book_id(query.id.as_deref(), "id is required")?;

    state
        .store
        .delete_book(id)
        .await?
        .then_some(())
        .or_not_found(BOOK_NOT_FOUND)?;

    info!("Deleted book {}", id);
    Ok(Json(json!({ "message": "Book deleted" })))
}
