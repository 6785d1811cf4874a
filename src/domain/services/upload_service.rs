use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::process::Command;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{ALLOWED_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::domain::models::{upload::UploadedFile, user::User};
use crate::domain::ports::{BlobStore, ChunkVector, FileRepository, LlmService, TranscriptionService, VectorIndex};
use crate::domain::services::chunker::{chunk_text, DEFAULT_CHUNK_SIZE};
use crate::error::AppError;

/// Lowercased extension without the dot, if any.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Filename without directory components or extension. Derived blob keys
/// all hang off this stem.
pub fn base_name(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
        .to_string()
}

pub fn audio_key(filename: &str) -> String {
    format!("uploads/{filename}")
}

pub fn transcript_key(filename: &str) -> String {
    format!("transcripts/{}.txt", base_name(filename))
}

pub fn segments_key(filename: &str) -> String {
    format!("transcripts/{}.json", base_name(filename))
}

pub fn note_key(filename: &str) -> String {
    format!("transcripts/{}_note.json", base_name(filename))
}

pub fn tag_key(filename: &str) -> String {
    format!("transcripts/{}_tag.json", base_name(filename))
}

pub fn quiz_key(filename: &str) -> String {
    format!("transcripts/{}_quiz.json", base_name(filename))
}

/// Every blob a file owns; deletion removes them all.
pub fn derived_keys(filename: &str) -> Vec<String> {
    vec![
        audio_key(filename),
        transcript_key(filename),
        segments_key(filename),
        note_key(filename),
        tag_key(filename),
        quiz_key(filename),
    ]
}

pub struct UploadService {
    upload_dir: String,
    blob_store: Arc<dyn BlobStore>,
    transcription: Arc<dyn TranscriptionService>,
    llm: Arc<dyn LlmService>,
    vector_index: Arc<dyn VectorIndex>,
    file_repo: Arc<dyn FileRepository>,
}

impl UploadService {
    pub fn new(
        upload_dir: String,
        blob_store: Arc<dyn BlobStore>,
        transcription: Arc<dyn TranscriptionService>,
        llm: Arc<dyn LlmService>,
        vector_index: Arc<dyn VectorIndex>,
        file_repo: Arc<dyn FileRepository>,
    ) -> Self {
        Self {
            upload_dir,
            blob_store,
            transcription,
            llm,
            vector_index,
            file_repo,
        }
    }

    /// Save, transcribe, store and index one upload.
    ///
    /// Unsupported extensions are rejected before any processing. A
    /// transcription failure aborts without leaving a file row behind.
    /// Indexing failures are logged and swallowed: the file stays
    /// downloadable even when not yet searchable.
    pub async fn process_upload(
        &self,
        user: &User,
        original_filename: &str,
        body: &[u8],
    ) -> Result<UploadedFile, AppError> {
        let extension = extension_of(original_filename)
            .ok_or_else(|| AppError::Validation("File has no extension".to_string()))?;

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AppError::Validation(format!(
                "Unsupported file type: .{extension}"
            )));
        }

        let unique_name = format!("{}.{}", Uuid::new_v4().simple(), extension);

        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| AppError::InternalWithMsg(format!("Failed to create upload dir: {e}")))?;

        let local_path = PathBuf::from(&self.upload_dir).join(&unique_name);
        tokio::fs::write(&local_path, body)
            .await
            .map_err(|e| AppError::InternalWithMsg(format!("Failed to save upload: {e}")))?;

        let result = self.transcribe_and_store(user, &unique_name, &local_path, body, &extension).await;

        // Local temp files are removed on success and on every failure path.
        let _ = tokio::fs::remove_file(&local_path).await;

        result
    }

    async fn transcribe_and_store(
        &self,
        user: &User,
        unique_name: &str,
        local_path: &Path,
        body: &[u8],
        extension: &str,
    ) -> Result<UploadedFile, AppError> {
        let audio_path = if VIDEO_EXTENSIONS.contains(&extension) {
            let wav_path = local_path.with_extension("wav");
            let extracted = self.extract_audio(local_path, &wav_path).await;
            if let Err(e) = extracted {
                let _ = tokio::fs::remove_file(&wav_path).await;
                return Err(e);
            }
            wav_path
        } else {
            local_path.to_path_buf()
        };

        let transcription = self.transcription.transcribe(&audio_path, unique_name).await;

        if audio_path.as_path() != local_path {
            let _ = tokio::fs::remove_file(&audio_path).await;
        }

        let transcription = transcription?;
        info!("Transcription complete for {}", unique_name);

        let audio_key = audio_key(unique_name);
        let transcript_key = transcript_key(unique_name);
        let segments_key = segments_key(unique_name);

        self.blob_store
            .put(&audio_key, body, "application/octet-stream")
            .await?;
        self.blob_store
            .put(&transcript_key, transcription.text.as_bytes(), "text/plain")
            .await?;
        let segments_json = serde_json::to_vec(&transcription.segments)
            .map_err(|e| AppError::InternalWithMsg(format!("Failed to serialize segments: {e}")))?;
        self.blob_store
            .put(&segments_key, &segments_json, "application/json")
            .await?;

        // Best-effort: a failed indexing pass leaves the upload usable.
        if let Err(e) = self.index_transcript(&transcription.text, &transcript_key).await {
            warn!("Indexing failed for {}: {}", transcript_key, e);
        }

        let file = UploadedFile::new(
            user.id.clone(),
            unique_name.to_string(),
            body.len() as i64,
            self.blob_store.url_for(&audio_key),
            self.blob_store.url_for(&transcript_key),
        );

        self.file_repo.create(&file).await
    }

    async fn index_transcript(&self, text: &str, source: &str) -> Result<(), AppError> {
        let chunks = chunk_text(text, DEFAULT_CHUNK_SIZE);
        if chunks.is_empty() {
            return Ok(());
        }

        let mut entries = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let values = self.llm.embed(chunk).await?;
            entries.push(ChunkVector {
                id: Uuid::new_v4().to_string(),
                values,
                text: chunk.clone(),
                source: source.to_string(),
            });
        }

        let count = entries.len();
        self.vector_index.upsert(entries).await?;
        info!("Indexed {} chunks for {}", count, source);
        Ok(())
    }

    /// 16 kHz mono PCM extraction for video containers.
    async fn extract_audio(&self, input: &Path, output: &Path) -> Result<(), AppError> {
        let result = Command::new("ffmpeg")
            .arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"])
            .arg(output)
            .output()
            .await
            .map_err(|e| AppError::Dependency {
                service: "ffmpeg",
                detail: e.to_string(),
            })?;

        if !result.status.success() {
            return Err(AppError::Dependency {
                service: "ffmpeg",
                detail: String::from_utf8_lossy(&result.stderr).into_owned(),
            });
        }

        Ok(())
    }
}
