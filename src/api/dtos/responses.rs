use crate::domain::models::upload::TranscriptSegment;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub role: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub display_name: String,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub user_email: String,
    pub display_name: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
    pub audio_url: String,
    pub transcript_url: String,
}

#[derive(Serialize)]
pub struct TranscriptListItem {
    pub filename: String,
    pub file_size: i64,
    pub upload_timestamp: DateTime<Utc>,
    pub audio_url: String,
    pub transcript_url: String,
}

#[derive(Serialize)]
pub struct TranscriptResponse {
    pub transcript: String,
    pub segments: Vec<TranscriptSegment>,
}

#[derive(Serialize)]
pub struct InviteResponse {
    pub invite_link: String,
    pub code: String,
}

#[derive(Serialize)]
pub struct QaHistoryItem {
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
    pub sources_used: serde_json::Value,
}

#[derive(Serialize)]
pub struct QaHistoryResponse {
    pub history: Vec<QaHistoryItem>,
}
