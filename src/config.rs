use std::env;

/// File extensions accepted by the upload endpoint.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "wav", "mp3", "m4a", "flac", "ogg", "mp4", "mov", "mkv", "avi",
];

/// Video containers that need an audio-extraction pass before transcription.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi"];

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub public_base_url: String,
    pub data_dir: String,
    pub upload_dir: String,
    pub max_file_size: usize,
    pub jwt_secret_key: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub pinecone_api_key: String,
    pub pinecone_index_host: String,
    pub mail_service_url: String,
    pub mail_service_token: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            public_base_url: env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            max_file_size: env::var("MAX_FILE_SIZE").unwrap_or_else(|_| "100000000".to_string()).parse().expect("MAX_FILE_SIZE must be a number"),
            jwt_secret_key: env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set"),
            openai_api_key: env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set"),
            openai_base_url: env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com".to_string()),
            chat_model: env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            embedding_model: env::var("EMBEDDING_MODEL").unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            pinecone_api_key: env::var("PINECONE_API_KEY").expect("PINECONE_API_KEY must be set"),
            pinecone_index_host: env::var("PINECONE_INDEX_HOST").expect("PINECONE_INDEX_HOST must be set"),
            mail_service_url: env::var("MAIL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
        }
    }
}
