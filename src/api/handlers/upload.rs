use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::api::dtos::responses::UploadResponse;
use crate::api::extractors::auth::AuthUser;
use crate::api::handlers::{client_ip, log_activity};
use crate::error::AppError;
use crate::state::AppState;

pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let is_file_field = field.name() == Some("file") || field.file_name().is_some();
        if !is_file_field {
            continue;
        }

        let filename = field
            .file_name()
            .ok_or_else(|| AppError::Validation("Upload field has no filename".to_string()))?
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload body: {e}")))?;

        upload = Some((filename, data.to_vec()));
        break;
    }

    let (original_filename, data) =
        upload.ok_or_else(|| AppError::Validation("No file field in request".to_string()))?;

    let file = state
        .upload_service
        .process_upload(&user, &original_filename, &data)
        .await?;

    log_activity(&state, &user.email, "upload", Some(file.filename.clone()), client_ip(&headers)).await;

    Ok(Json(UploadResponse {
        message: "File uploaded and transcribed".to_string(),
        filename: file.filename,
        audio_url: file.audio_url,
        transcript_url: file.transcript_url,
    }))
}
