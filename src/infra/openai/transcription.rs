use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Deserialize;
use tracing::info;

use crate::config::Config;
use crate::domain::models::upload::{Transcription, TranscriptSegment};
use crate::domain::ports::TranscriptionService;
use crate::error::AppError;

const TRANSCRIBE_TIMEOUT: Duration = Duration::from_secs(120);
const TRANSCRIBE_MODEL: &str = "whisper-1";

pub struct WhisperApiService {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct WhisperResponse {
    text: String,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl WhisperApiService {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            api_key: config.openai_api_key.clone(),
        }
    }
}

#[async_trait]
impl TranscriptionService for WhisperApiService {
    async fn transcribe(&self, audio_path: &Path, filename: &str) -> Result<Transcription, AppError> {
        let bytes = tokio::fs::read(audio_path).await.map_err(|e| AppError::Dependency {
            service: "transcription",
            detail: format!("audio file unreadable: {e}"),
        })?;

        let part = multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| AppError::Dependency {
                service: "transcription",
                detail: e.to_string(),
            })?;

        let form = multipart::Form::new()
            .part("file", part)
            .text("model", TRANSCRIBE_MODEL)
            .text("response_format", "verbose_json");

        let url = format!("{}/v1/audio/transcriptions", self.base_url);
        info!("Transcribing {}", filename);

        let response = self
            .client
            .post(&url)
            .timeout(TRANSCRIBE_TIMEOUT)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Dependency {
                service: "transcription",
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Dependency {
                service: "transcription",
                detail: format!("{status}: {text}"),
            });
        }

        let body: WhisperResponse = response.json().await.map_err(|e| AppError::Dependency {
            service: "transcription",
            detail: format!("response decode failed: {e}"),
        })?;

        let segments = body
            .segments
            .into_iter()
            .map(|s| TranscriptSegment {
                start: round2(s.start),
                end: round2(s.end),
                text: s.text.trim().to_string(),
            })
            .collect();

        Ok(Transcription {
            text: body.text,
            segments,
        })
    }
}
