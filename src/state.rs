use std::sync::Arc;
use crate::background::JobSender;
use crate::config::Config;
use crate::domain::ports::{
    ActivityLogRepository, BlobStore, EmailService, FileRepository, InviteRepository,
    LlmService, QaRepository, TranscriptionService, UserRepository, VectorIndex,
};
use crate::domain::services::auth_service::AuthService;
use crate::domain::services::qa_service::QaService;
use crate::domain::services::upload_service::UploadService;
use tera::Tera;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_repo: Arc<dyn UserRepository>,
    pub invite_repo: Arc<dyn InviteRepository>,
    pub file_repo: Arc<dyn FileRepository>,
    pub qa_repo: Arc<dyn QaRepository>,
    pub activity_repo: Arc<dyn ActivityLogRepository>,
    pub blob_store: Arc<dyn BlobStore>,
    pub transcription: Arc<dyn TranscriptionService>,
    pub llm: Arc<dyn LlmService>,
    pub vector_index: Arc<dyn VectorIndex>,
    pub email_service: Arc<dyn EmailService>,
    pub auth_service: Arc<AuthService>,
    pub upload_service: Arc<UploadService>,
    pub qa_service: Arc<QaService>,
    pub templates: Arc<Tera>,
    pub jobs: JobSender,
}
