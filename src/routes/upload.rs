//! CSV upload route

use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::{Json, Router};

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::upload::{ingest_csv, UploadOutcome};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(upload_file))
}

/// POST /api/v1/upload
///
/// Multipart form with a single `file` field holding the CSV payload. The
/// new entry becomes the active selection.
async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadOutcome>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("upload has no file name".into()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let outcome = ingest_csv(&bytes, &file_name, state.cache(), state.store()).await?;
        state.select(&outcome.name).await;
        return Ok(Json(outcome));
    }

    Err(AppError::BadRequest(
        "multipart field 'file' is required".into(),
    ))
}
