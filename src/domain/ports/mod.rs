use crate::domain::models::{
    activity::{ActionCount, ActivityLogEntry, UserActivityCount},
    invite::Invite,
    qa::{AskerCount, QaRecord, SourceChunk},
    upload::{FileExportRow, FileStats, Transcription, UploadedFile},
    user::User,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::Stream;
use std::path::Path;
use std::pin::Pin;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn update_password(&self, id: &str, password_hash: &str) -> Result<(), AppError>;
    async fn count(&self) -> Result<i64, AppError>;
}

#[async_trait]
pub trait InviteRepository: Send + Sync {
    async fn create(&self, invite: &Invite) -> Result<(), AppError>;
    /// Marks an unused code as used. Returns false when the code does not
    /// exist or was already consumed; true exactly once per code.
    async fn consume(&self, code: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn create(&self, file: &UploadedFile) -> Result<UploadedFile, AppError>;
    async fn find_by_filename(&self, user_id: &str, filename: &str) -> Result<Option<UploadedFile>, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<UploadedFile>, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
    async fn count(&self) -> Result<i64, AppError>;
    async fn size_stats(&self) -> Result<FileStats, AppError>;
    async fn export_rows(&self) -> Result<Vec<FileExportRow>, AppError>;
}

#[async_trait]
pub trait QaRepository: Send + Sync {
    async fn create(&self, record: &QaRecord) -> Result<(), AppError>;
    async fn list_recent(&self, email: &str, limit: i64) -> Result<Vec<QaRecord>, AppError>;
    async fn count(&self) -> Result<i64, AppError>;
    async fn top_askers(&self, limit: i64) -> Result<Vec<AskerCount>, AppError>;
}

#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    async fn append(&self, entry: &ActivityLogEntry) -> Result<(), AppError>;
    async fn list_recent(&self, limit: i64) -> Result<Vec<ActivityLogEntry>, AppError>;
    async fn counts_by_user(&self) -> Result<Vec<UserActivityCount>, AppError>;
    async fn counts_by_action_since(&self, since: DateTime<Utc>) -> Result<Vec<ActionCount>, AppError>;
}

/// Durable object storage for raw audio, transcript text and the JSON
/// side files (segments, notes, tags, quizzes), keyed by path-like names.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), AppError>;
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError>;
    async fn delete_many(&self, keys: &[String]) -> Result<(), AppError>;
    fn url_for(&self, key: &str) -> String;
}

#[async_trait]
pub trait TranscriptionService: Send + Sync {
    async fn transcribe(&self, audio_path: &Path, filename: &str) -> Result<Transcription, AppError>;
}

pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, AppError>> + Send>>;

#[async_trait]
pub trait LlmService: Send + Sync {
    /// Embed one non-empty text. Callers guard against empty input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError>;
    async fn complete(&self, prompt: &str) -> Result<String, AppError>;
    async fn stream_complete(&self, prompt: &str) -> Result<TokenStream, AppError>;
}

/// One chunk ready for upsert into the vector index.
pub struct ChunkVector {
    pub id: String,
    pub values: Vec<f32>,
    pub text: String,
    pub source: String,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Idempotent by id: re-upserting an id replaces its vector/metadata.
    async fn upsert(&self, entries: Vec<ChunkVector>) -> Result<(), AppError>;
    /// Up to `top_k` nearest entries, descending score. Tie-break order is
    /// whatever the backing index returns.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<SourceChunk>, AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError>;
}
