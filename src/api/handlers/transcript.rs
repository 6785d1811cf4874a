use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use std::io::{Cursor, Write};
use std::sync::Arc;
use tracing::{info, warn};
use zip::write::SimpleFileOptions;

use crate::api::dtos::requests::SaveSegmentsRequest;
use crate::api::dtos::responses::{TranscriptListItem, TranscriptResponse};
use crate::api::extractors::auth::AuthUser;
use crate::api::handlers::{client_ip, log_activity};
use crate::domain::models::upload::TranscriptSegment;
use crate::domain::services::upload_service::{base_name, derived_keys, segments_key, transcript_key};
use crate::error::AppError;
use crate::state::AppState;

/// Stored filenames are generated uuids plus an extension; anything with
/// path separators never came from this service.
fn validate_filename(filename: &str) -> Result<(), AppError> {
    if filename.is_empty() || filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(AppError::Validation("Invalid filename".to_string()));
    }
    Ok(())
}

pub async fn list_transcripts(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let files = state.file_repo.list_by_user(&user.id).await?;

    let items: Vec<TranscriptListItem> = files
        .into_iter()
        .map(|f| TranscriptListItem {
            filename: f.filename,
            file_size: f.file_size,
            upload_timestamp: f.upload_timestamp,
            audio_url: f.audio_url,
            transcript_url: f.transcript_url,
        })
        .collect();

    Ok(Json(items))
}

pub async fn get_transcript(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_filename(&filename)?;

    let text = state
        .blob_store
        .get(&transcript_key(&filename))
        .await?
        .ok_or_else(|| AppError::NotFound("Transcript not found".to_string()))?;

    // Missing segments are fine: the transcript is still readable.
    let segments: Vec<TranscriptSegment> = match state.blob_store.get(&segments_key(&filename)).await? {
        Some(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
        None => Vec::new(),
    };

    Ok(Json(TranscriptResponse {
        transcript: String::from_utf8_lossy(&text).into_owned(),
        segments,
    }))
}

/// Public share link: transcript text only, no auth.
pub async fn get_shared_transcript(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_filename(&filename)?;

    let text = state
        .blob_store
        .get(&transcript_key(&filename))
        .await?
        .ok_or_else(|| AppError::NotFound("Shared transcript not found".to_string()))?;

    Ok(Json(serde_json::json!({
        "transcript": String::from_utf8_lossy(&text).into_owned(),
    })))
}

pub async fn delete_transcript(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    headers: HeaderMap,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_filename(&filename)?;

    let record = state
        .file_repo
        .find_by_filename(&user.id, &filename)
        .await?
        .ok_or_else(|| AppError::NotFound("File record not found in database".to_string()))?;

    state.file_repo.delete(&record.id).await?;

    log_activity(&state, &user.email, "delete", Some(filename.clone()), client_ip(&headers)).await;

    // The row is gone either way; a storage failure here still reports 500
    // so the caller knows orphaned blobs may remain.
    state
        .blob_store
        .delete_many(&derived_keys(&filename))
        .await
        .map_err(|_| {
            AppError::InternalWithMsg(
                "Failed to delete all stored files, but the database record was removed".to_string(),
            )
        })?;

    info!("Deleted {} and all associated data", filename);

    Ok(Json(serde_json::json!({
        "message": format!("Successfully deleted {filename} and all associated data."),
    })))
}

pub async fn download_transcript(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_filename(&filename)?;

    let text = state
        .blob_store
        .get(&transcript_key(&filename))
        .await?
        .ok_or_else(|| AppError::NotFound("Transcript not found".to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}.txt", base_name(&filename)),
            ),
        ],
        text,
    ))
}

pub async fn download_all_transcripts(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let files = state.file_repo.list_by_user(&user.id).await?;

    let mut zip_writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for file in &files {
        let key = transcript_key(&file.filename);
        match state.blob_store.get(&key).await? {
            Some(bytes) => {
                let arcname = format!("{}.txt", base_name(&file.filename));
                zip_writer
                    .start_file(arcname, options)
                    .map_err(|e| AppError::InternalWithMsg(format!("Zip write failed: {e}")))?;
                zip_writer
                    .write_all(&bytes)
                    .map_err(|e| AppError::InternalWithMsg(format!("Zip write failed: {e}")))?;
            }
            None => {
                warn!("Skipping {}, not found during zip creation", key);
            }
        }
    }

    let cursor = zip_writer
        .finish()
        .map_err(|e| AppError::InternalWithMsg(format!("Zip finalize failed: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}_transcripts.zip", user.email),
            ),
        ],
        cursor.into_inner(),
    ))
}

/// Whole-list overwrite; segments are replaceable, not versioned.
pub async fn save_segments(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
    Path(filename): Path<String>,
    Json(payload): Json<SaveSegmentsRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_filename(&filename)?;

    let body = serde_json::to_vec(&payload.segments)
        .map_err(|e| AppError::InternalWithMsg(format!("Failed to serialize segments: {e}")))?;

    state
        .blob_store
        .put(&segments_key(&filename), &body, "application/json")
        .await?;

    Ok(Json(serde_json::json!({ "message": "Segments updated successfully" })))
}
