//! OCR ingestion routes
//!
//! Staging, status, approval (which triggers the one submission), and
//! cancellation of the pending image.

use axum::extract::{Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::ocr::{OcrOutcome, PendingStatus};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/image", post(stage_image))
        .route("/pending", get(pending_status).delete(cancel_pending))
        .route("/approve", post(approve_and_submit))
}

/// POST /api/v1/ocr/image
///
/// Multipart form with a single `image` field. Rejected with a conflict
/// while another image is pending; the in-flight one is never replaced.
async fn stage_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PendingStatus>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("image has no file name".into()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let mut pipeline = state.pipeline().write().await;
        pipeline.stage(&file_name, bytes.to_vec())?;
        return Ok(Json(pipeline.status()));
    }

    Err(AppError::BadRequest(
        "multipart field 'image' is required".into(),
    ))
}

/// GET /api/v1/ocr/pending
async fn pending_status(State(state): State<AppState>) -> Json<PendingStatus> {
    Json(state.pipeline().read().await.status())
}

#[derive(Serialize)]
struct CancelResponse {
    cancelled: String,
}

/// DELETE /api/v1/ocr/pending
async fn cancel_pending(State(state): State<AppState>) -> Result<Json<CancelResponse>> {
    let cancelled = state
        .pipeline()
        .write()
        .await
        .cancel()
        .ok_or(AppError::NoPendingImage)?;
    Ok(Json(CancelResponse { cancelled }))
}

/// POST /api/v1/ocr/approve
///
/// The explicit approval signal: the sole gate before the external OCR
/// request. Approves the pending image and submits it in the same event;
/// the write lock is held across the submission, so no second stage or
/// approval can interleave with it.
async fn approve_and_submit(State(state): State<AppState>) -> Result<Json<OcrOutcome>> {
    let mut pipeline = state.pipeline().write().await;
    pipeline.approve()?;

    let outcome = pipeline
        .submit(
            state.extractor(),
            &state.config().ocr.language,
            state.store(),
            state.cache(),
        )
        .await?;

    state.select(&outcome.name).await;
    Ok(Json(outcome))
}
