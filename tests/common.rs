#![allow(dead_code)]

use transcriber_backend::{
    api::router::create_router,
    background::{job_channel, start_background_worker},
    config::Config,
    domain::models::qa::SourceChunk,
    domain::models::upload::{Transcription, TranscriptSegment},
    domain::ports::{
        ChunkVector, EmailService, LlmService, TokenStream, TranscriptionService, VectorIndex,
    },
    domain::services::auth_service::AuthService,
    domain::services::qa_service::QaService,
    domain::services::upload_service::UploadService,
    error::AppError,
    infra::repositories::{
        sqlite_activity_repo::SqliteActivityRepo, sqlite_file_repo::SqliteFileRepo,
        sqlite_invite_repo::SqliteInviteRepo, sqlite_qa_repo::SqliteQaRepo,
        sqlite_user_repo::SqliteUserRepo,
    },
    infra::storage::fs_blob_store::FsBlobStore,
    state::AppState,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tera::Tera;
use tower::ServiceExt;
use serde_json::{json, Value};
use uuid::Uuid;

pub const MOCK_TRANSCRIPT: &str = "Hello world.\nThis is a test transcript about quarterly planning.";

pub struct MockEmailService;

#[async_trait]
impl EmailService for MockEmailService {
    async fn send(&self, _recipient: &str, _subject: &str, _html_body: &str) -> Result<(), AppError> {
        Ok(())
    }
}

pub struct MockTranscriptionService {
    pub fail: bool,
}

#[async_trait]
impl TranscriptionService for MockTranscriptionService {
    async fn transcribe(&self, _audio_path: &Path, _filename: &str) -> Result<Transcription, AppError> {
        if self.fail {
            return Err(AppError::Dependency {
                service: "transcription",
                detail: "mock transcription failure".to_string(),
            });
        }

        Ok(Transcription {
            text: MOCK_TRANSCRIPT.to_string(),
            segments: vec![
                TranscriptSegment {
                    start: 0.0,
                    end: 1.5,
                    text: "Hello world.".to_string(),
                },
                TranscriptSegment {
                    start: 1.5,
                    end: 4.2,
                    text: "This is a test transcript about quarterly planning.".to_string(),
                },
            ],
        })
    }
}

pub struct MockLlmService {
    pub tokens: Vec<String>,
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        // Deterministic but text-dependent, enough for shape assertions.
        let seed = text.len() as f32;
        Ok((0..8).map(|i| (seed + i as f32) / 100.0).collect())
    }

    async fn complete(&self, _prompt: &str) -> Result<String, AppError> {
        Ok("What topic is covered in this segment?".to_string())
    }

    async fn stream_complete(&self, _prompt: &str) -> Result<TokenStream, AppError> {
        let tokens: Vec<Result<String, AppError>> =
            self.tokens.iter().cloned().map(Ok).collect();
        Ok(Box::pin(futures_util::stream::iter(tokens)))
    }
}

#[derive(Default)]
pub struct MockVectorIndex {
    pub fail: bool,
    pub entries: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl VectorIndex for MockVectorIndex {
    async fn upsert(&self, entries: Vec<ChunkVector>) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::Dependency {
                service: "vector-index",
                detail: "mock upsert failure".to_string(),
            });
        }

        let mut store = self.entries.lock().unwrap();
        for entry in entries {
            store.retain(|(id, _, _)| id != &entry.id);
            store.push((entry.id, entry.text, entry.source));
        }
        Ok(())
    }

    async fn query(&self, _vector: &[f32], top_k: usize) -> Result<Vec<SourceChunk>, AppError> {
        if self.fail {
            return Err(AppError::Dependency {
                service: "vector-index",
                detail: "mock query failure".to_string(),
            });
        }

        let store = self.entries.lock().unwrap();
        Ok(store
            .iter()
            .take(top_k)
            .enumerate()
            .map(|(i, (_, text, source))| SourceChunk {
                text: text.clone(),
                source: source.clone(),
                score: 0.95 - 0.05 * i as f32,
            })
            .collect())
    }
}

pub struct AuthSession {
    pub access_token: String,
    pub refresh_cookie: String,
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub data_dir: PathBuf,
    pub state: Arc<AppState>,
}

pub struct TestAppOptions {
    pub transcription_fails: bool,
    pub vector_index_fails: bool,
    pub llm_tokens: Vec<String>,
}

impl Default for TestAppOptions {
    fn default() -> Self {
        Self {
            transcription_fails: false,
            vector_index_fails: false,
            llm_tokens: vec!["The meeting".to_string(), " covered planning.".to_string()],
        }
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_options(TestAppOptions::default()).await
    }

    pub async fn with_failing_transcription() -> Self {
        Self::with_options(TestAppOptions {
            transcription_fails: true,
            ..Default::default()
        })
        .await
    }

    pub async fn with_failing_vector_index() -> Self {
        Self::with_options(TestAppOptions {
            vector_index_fails: true,
            ..Default::default()
        })
        .await
    }

    pub async fn with_llm_tokens(tokens: &[&str]) -> Self {
        Self::with_options(TestAppOptions {
            llm_tokens: tokens.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        })
        .await
    }

    pub async fn with_options(options: TestAppOptions) -> Self {
        let run_id = Uuid::new_v4();
        let db_filename = format!("test_{run_id}.db");
        let db_url = format!("sqlite://{db_filename}?mode=rwc");
        let data_dir = std::env::temp_dir().join(format!("transcriber_test_{run_id}"));

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            public_base_url: "http://localhost:3000".to_string(),
            data_dir: data_dir.to_string_lossy().into_owned(),
            upload_dir: data_dir.join("tmp").to_string_lossy().into_owned(),
            max_file_size: 10_000_000,
            jwt_secret_key: "test-secret-key".to_string(),
            openai_api_key: "test".to_string(),
            openai_base_url: "http://localhost:1".to_string(),
            chat_model: "test-model".to_string(),
            embedding_model: "test-embed".to_string(),
            pinecone_api_key: "test".to_string(),
            pinecone_index_host: "http://localhost:1".to_string(),
            mail_service_url: "http://localhost:1".to_string(),
            mail_service_token: "token".to_string(),
        };

        let mut tera = Tera::default();
        tera.add_raw_template("welcome.html", "<html>Welcome {{ display_name }}</html>").unwrap();
        let templates = Arc::new(tera);

        let user_repo = Arc::new(SqliteUserRepo::new(pool.clone()));
        let invite_repo = Arc::new(SqliteInviteRepo::new(pool.clone()));
        let file_repo = Arc::new(SqliteFileRepo::new(pool.clone()));
        let qa_repo = Arc::new(SqliteQaRepo::new(pool.clone()));
        let activity_repo = Arc::new(SqliteActivityRepo::new(pool.clone()));

        let blob_store = Arc::new(FsBlobStore::new(
            data_dir.clone(),
            config.public_base_url.clone(),
        ));
        let transcription = Arc::new(MockTranscriptionService {
            fail: options.transcription_fails,
        });
        let llm = Arc::new(MockLlmService {
            tokens: options.llm_tokens,
        });
        let vector_index = Arc::new(MockVectorIndex {
            fail: options.vector_index_fails,
            entries: Mutex::new(Vec::new()),
        });

        let auth_service = Arc::new(AuthService::new(&config));
        let upload_service = Arc::new(UploadService::new(
            config.upload_dir.clone(),
            blob_store.clone(),
            transcription.clone(),
            llm.clone(),
            vector_index.clone(),
            file_repo.clone(),
        ));
        let qa_service = Arc::new(QaService::new(llm.clone(), vector_index.clone()));

        let (jobs_tx, jobs_rx) = job_channel();

        let state = Arc::new(AppState {
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
            email_service: Arc::new(MockEmailService),
            auth_service,
            upload_service,
            qa_service,
            templates,
            jobs: jobs_tx,
        });

        let worker_state = state.clone();
        tokio::spawn(async move {
            start_background_worker(worker_state, jobs_rx).await;
        });

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            data_dir,
            state,
        }
    }

    pub async fn register(&self, email: &str, password: &str, invite: Option<&str>) -> axum::response::Response {
        let payload = json!({
            "email": email,
            "password": password,
            "password_confirm": password,
            "name": null,
            "invite": invite,
        });

        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthSession {
        let payload = json!({ "email": email, "password": password });

        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        if !response.status().is_success() {
            panic!("Login failed in test helper: status {}", response.status());
        }

        let refresh_cookie = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|h| h.to_str().unwrap().to_string())
            .find(|c| c.contains("refresh_token="))
            .expect("No refresh_token cookie returned");

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body_json: Value = serde_json::from_slice(&body_bytes).unwrap();
        let access_token = body_json["access_token"]
            .as_str()
            .expect("No access_token in body")
            .to_string();

        AuthSession {
            access_token,
            refresh_cookie,
        }
    }

    /// Registers an owner and logs in, returning the session.
    pub async fn register_and_login(&self, email: &str, password: &str) -> AuthSession {
        let response = self.register(email, password, None).await;
        assert!(
            response.status().is_success(),
            "registration failed: {}",
            response.status()
        );
        self.login(email, password).await
    }

    pub async fn upload(&self, session: &AuthSession, filename: &str, content: &[u8]) -> axum::response::Response {
        let (content_type, body) = multipart_body(filename, content);

        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/upload")
                    .header(header::AUTHORIZATION, format!("Bearer {}", session.access_token))
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    pub async fn get_authed(&self, session: &AuthSession, uri: &str) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .header(header::AUTHORIZATION, format!("Bearer {}", session.access_token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    pub async fn post_json(&self, session: &AuthSession, uri: &str, payload: Value) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::AUTHORIZATION, format!("Bearer {}", session.access_token))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

pub fn multipart_body(filename: &str, content: &[u8]) -> (String, Vec<u8>) {
    let boundary = "X-TEST-BOUNDARY";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

#[allow(dead_code)]
pub async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}
