use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::{MediaItem, MediaKey, MediaKind},
    state::AppState,
};

/// Watch-later list in insertion order
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<MediaItem>>> {
    let store = state.favorites.lock().await;
    Ok(Json(store.list().await?))
}

/// Appends a title; the same title may be added more than once
pub async fn add(
    State(state): State<AppState>,
    Json(item): Json<MediaItem>,
) -> AppResult<(StatusCode, Json<Vec<MediaItem>>)> {
    let store = state.favorites.lock().await;
    let items = store.add(item).await?;
    Ok((StatusCode::CREATED, Json(items)))
}

#[derive(Debug, Serialize)]
pub struct FavoriteStatus {
    pub kind: MediaKind,
    pub id: u64,
    pub saved: bool,
}

/// Whether the title is on the watch-later list
pub async fn status(
    State(state): State<AppState>,
    Path((kind, id)): Path<(MediaKind, u64)>,
) -> AppResult<Json<FavoriteStatus>> {
    let store = state.favorites.lock().await;
    let saved = store.contains(MediaKey { id, kind }).await?;
    Ok(Json(FavoriteStatus { kind, id, saved }))
}

/// Removes every entry for the title
pub async fn remove(
    State(state): State<AppState>,
    Path((kind, id)): Path<(MediaKind, u64)>,
) -> AppResult<StatusCode> {
    let key = MediaKey { id, kind };
    let store = state.favorites.lock().await;

    if store.remove(key).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("{} is not in watch later", key)))
    }
}
