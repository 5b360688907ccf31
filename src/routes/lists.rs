//! List sessions: one incremental list per client-side scroller.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::MediaItem,
    services::{
        catalog::or_empty,
        pagination::{IncrementalList, ListSnapshot, LoadOutcome, PageSource},
        registry::CategoryPages,
    },
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct OpenListRequest {
    pub slug: String,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub id: Uuid,
    #[serde(flatten)]
    pub list: ListSnapshot,
}

#[derive(Debug, Serialize)]
pub struct MoreResponse {
    pub id: Uuid,
    pub result: LoadOutcome,
    #[serde(flatten)]
    pub list: ListSnapshot,
}

/// Resolves `slug` and fetches its first page
async fn open_source(
    state: &AppState,
    slug: &str,
) -> AppResult<(Arc<dyn PageSource>, Vec<MediaItem>)> {
    let descriptor = state.registry.resolve(slug)?;
    let source: Arc<dyn PageSource> = Arc::new(CategoryPages::new(descriptor, state.catalog.clone()));
    let first_page = or_empty(source.fetch_page(1).await, slug);
    Ok((source, first_page))
}

/// Opens a session seeded with the category's first page
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<OpenListRequest>,
) -> AppResult<(StatusCode, Json<ListResponse>)> {
    let (source, first_page) = open_source(&state, &request.slug).await?;
    let list = IncrementalList::new(source, first_page);
    let snapshot = list.snapshot();

    let (id, _) = state.insert_list(list).await;
    tracing::info!(list_id = %id, slug = %request.slug, items = snapshot.items.len(), "Opened list session");

    Ok((StatusCode::CREATED, Json(ListResponse { id, list: snapshot })))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ListResponse>> {
    let handle = state.list(id).await?;
    let list = handle.lock().await;
    Ok(Json(ListResponse {
        id,
        list: list.snapshot(),
    }))
}

/// Switches the session to another category, resetting it
pub async fn switch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<OpenListRequest>,
) -> AppResult<Json<ListResponse>> {
    let handle = state.list(id).await?;
    let (source, first_page) = open_source(&state, &request.slug).await?;

    let mut list = handle.lock().await;
    list.switch_category(source, first_page);

    Ok(Json(ListResponse {
        id,
        list: list.snapshot(),
    }))
}

/// Loads the next page
///
/// The session lock is released while the page is fetched. A request arriving meanwhile
/// finds the list `loading` and reports it without fetching; a response that arrives after a
/// category switch is discarded. The fetch and its completion run on their own task, so a
/// caller that goes away mid-fetch still leaves the session `idle` or `exhausted`.
pub async fn more(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MoreResponse>> {
    let handle = state.list(id).await?;

    let (ticket, source) = {
        let mut list = handle.lock().await;
        match list.begin_load() {
            Some(ticket) => (ticket, list.source()),
            None => {
                return Ok(Json(MoreResponse {
                    id,
                    result: LoadOutcome::Skipped,
                    list: list.snapshot(),
                }))
            }
        }
    };

    let load = tokio::spawn(async move {
        let page = source.fetch_page(ticket.page).await;

        let mut list = handle.lock().await;
        let result = list.complete_load(ticket, page);
        tracing::debug!(list_id = %id, page = ticket.page, ?result, "Load more completed");
        (result, list.snapshot())
    });

    let (result, list) = load
        .await
        .map_err(|e| AppError::Internal(format!("Loading list {} failed: {}", id, e)))?;

    Ok(Json(MoreResponse { id, result, list }))
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<StatusCode> {
    if state.remove_list(id).await {
        tracing::info!(list_id = %id, "Closed list session");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Unknown list session: {}", id)))
    }
}
