use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{ConnectOptions, SqlitePool};
use tracing::info;
use tracing::log::LevelFilter;
use tera::Tera;

use crate::background::JobSender;
use crate::config::Config;
use crate::domain::services::auth_service::AuthService;
use crate::domain::services::qa_service::QaService;
use crate::domain::services::upload_service::UploadService;
use crate::infra::email::http_email_service::HttpEmailService;
use crate::infra::openai::llm_service::OpenAiService;
use crate::infra::openai::transcription::WhisperApiService;
use crate::infra::repositories::{
    sqlite_activity_repo::SqliteActivityRepo, sqlite_file_repo::SqliteFileRepo,
    sqlite_invite_repo::SqliteInviteRepo, sqlite_qa_repo::SqliteQaRepo,
    sqlite_user_repo::SqliteUserRepo,
};
use crate::infra::storage::fs_blob_store::FsBlobStore;
use crate::infra::vector::pinecone_index::PineconeIndex;
use crate::state::AppState;

pub async fn bootstrap_state(config: &Config, jobs: JobSender) -> AppState {
    info!("Initializing SQLite connection with WAL Mode...");

    let opts = SqliteConnectOptions::from_str(&config.database_url)
        .expect("Invalid SQLite connection string")
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .expect("Failed to connect to SQLite");

    run_migrations(&pool).await;

    let mut tera = Tera::default();
    tera.add_raw_template("welcome.html", include_str!("../templates/welcome.html"))
        .expect("Failed to load welcome template");
    let templates = Arc::new(tera);

    let user_repo = Arc::new(SqliteUserRepo::new(pool.clone()));
    let invite_repo = Arc::new(SqliteInviteRepo::new(pool.clone()));
    let file_repo = Arc::new(SqliteFileRepo::new(pool.clone()));
    let qa_repo = Arc::new(SqliteQaRepo::new(pool.clone()));
    let activity_repo = Arc::new(SqliteActivityRepo::new(pool.clone()));

    let blob_store = Arc::new(FsBlobStore::new(
        config.data_dir.clone(),
        config.public_base_url.clone(),
    ));
    let transcription = Arc::new(WhisperApiService::new(config));
    let llm = Arc::new(OpenAiService::new(config));
    let vector_index = Arc::new(PineconeIndex::new(config));
    let email_service = Arc::new(HttpEmailService::new(
        config.mail_service_url.clone(),
        config.mail_service_token.clone(),
    ));

    let auth_service = Arc::new(AuthService::new(config));
    let upload_service = Arc::new(UploadService::new(
        config.upload_dir.clone(),
        blob_store.clone(),
        transcription.clone(),
        llm.clone(),
        vector_index.clone(),
        file_repo.clone(),
    ));
    let qa_service = Arc::new(QaService::new(llm.clone(), vector_index.clone()));

    AppState {
        config: config.clone(),
        user_repo,
        invite_repo,
        file_repo,
        qa_repo,
        activity_repo,
        blob_store,
        transcription,
        llm,
        vector_index,
        email_service,
        auth_service,
        upload_service,
        qa_service,
        templates,
        jobs,
    }
}

async fn run_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
