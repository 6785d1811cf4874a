use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct UploadedFile {
    pub id: String,
    pub user_id: String,
    pub filename: String,
    pub file_size: i64,
    pub upload_timestamp: DateTime<Utc>,
    pub audio_url: String,
    pub transcript_url: String,
}

impl UploadedFile {
    pub fn new(
        user_id: String,
        filename: String,
        file_size: i64,
        audio_url: String,
        transcript_url: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            filename,
            file_size,
            upload_timestamp: Utc::now(),
            audio_url,
            transcript_url,
        }
    }
}

/// One timed slice of a transcript, seconds rounded to two decimals.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Output of the speech-to-text model: full text plus timed segments.
#[derive(Debug, Clone)]
pub struct Transcription {
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
}

/// Row shape for the admin CSV export (file joined with its owner's email).
#[derive(Debug, FromRow)]
pub struct FileExportRow {
    pub email: String,
    pub filename: String,
    pub upload_timestamp: DateTime<Utc>,
}

/// Aggregate upload statistics for the admin stats endpoint.
#[derive(Debug, Serialize, FromRow)]
pub struct FileStats {
    pub total_files: i64,
    pub total_size: i64,
    pub avg_size: f64,
}
