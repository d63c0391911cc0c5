//! File viewer routes
//!
//! Listing, single-entry content, the explicit refresh event, and the
//! current selection.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::library::{CacheEntry, FileKind, RefreshReport};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_entries))
        .route("/refresh", post(refresh))
        .route("/selected", get(get_selected).put(set_selected))
        .route("/:name", get(get_entry))
}

#[derive(Serialize)]
struct FileSummary {
    name: String,
    kind: FileKind,
    /// Data row count for tables, absent for text entries
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<usize>,
    fetched_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct FileListResponse {
    files: Vec<FileSummary>,
    selected: Option<String>,
    /// Whether the cached remote state is older than its validity window
    stale: bool,
}

/// GET /api/v1/files
///
/// Lists cached entries. When the cache is empty or its validity window has
/// lapsed, refreshes from the remote store first; a transport failure there
/// is reported in the log and the previous contents are served as-is.
async fn list_entries(State(state): State<AppState>) -> Result<Json<FileListResponse>> {
    let cache = state.cache();

    if cache.is_empty().await || cache.is_stale().await {
        if let Err(err) = cache.refresh(state.store()).await {
            tracing::warn!(error = %err, "background refresh failed, serving cached contents");
        }
    }

    let selected = state.reconcile_selection().await;

    let mut files: Vec<FileSummary> = cache
        .get_all()
        .await
        .into_iter()
        .map(|(name, entry)| FileSummary {
            name,
            kind: entry.content.kind(),
            rows: entry.content.row_count(),
            fetched_at: entry.fetched_at,
        })
        .collect();
    files.sort_by(|a, b| a.name.cmp(&b.name));

    let stale = cache.is_stale().await;
    Ok(Json(FileListResponse {
        files,
        selected,
        stale,
    }))
}

/// POST /api/v1/files/refresh
///
/// Explicit refresh event: replaces the cache with the remote contents and
/// returns the per-file report.
async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshReport>> {
    let report = state.cache().refresh(state.store()).await?;
    state.reconcile_selection().await;
    tracing::info!(
        loaded = report.loaded.len(),
        skipped = report.skipped.len(),
        "library refreshed"
    );
    Ok(Json(report))
}

/// GET /api/v1/files/:name
async fn get_entry(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CacheEntry>> {
    state
        .cache()
        .get(&name)
        .await
        .map(Json)
        .ok_or(AppError::NotFound(name))
}

#[derive(Serialize)]
struct SelectionResponse {
    selected: Option<String>,
}

/// GET /api/v1/files/selected
async fn get_selected(State(state): State<AppState>) -> Json<SelectionResponse> {
    Json(SelectionResponse {
        selected: state.selected().await,
    })
}

#[derive(Deserialize)]
struct SelectRequest {
    name: String,
}

/// PUT /api/v1/files/selected
///
/// The selection must always reference a key present in the cache.
async fn set_selected(
    State(state): State<AppState>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<SelectionResponse>> {
    if state.cache().get(&request.name).await.is_none() {
        return Err(AppError::NotFound(request.name));
    }
    state.select(&request.name).await;
    Ok(Json(SelectionResponse {
        selected: Some(request.name),
    }))
}
