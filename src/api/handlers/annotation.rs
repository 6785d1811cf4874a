use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::dtos::requests::{EditQuizRequest, NoteInput, QuizGenerateRequest, SuggestRequest, TagInput};
use crate::api::extractors::auth::AuthUser;
use crate::domain::services::upload_service::{note_key, quiz_key, tag_key};
use crate::error::AppError;
use crate::state::AppState;

/// Two quiz timestamps match when they agree within a hundredth of a
/// second.
const TIMESTAMP_EPSILON: f64 = 0.01;

#[derive(Serialize, Deserialize)]
struct OwnedNote {
    email: String,
    note: String,
}

#[derive(Serialize, Deserialize)]
struct OwnedTag {
    email: String,
    tag: String,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct QuizEntry {
    pub segment: String,
    pub question: String,
    pub timestamp: Option<f64>,
}

fn validate_filename(filename: &str) -> Result<(), AppError> {
    if filename.is_empty() || filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(AppError::Validation("Invalid filename".to_string()));
    }
    Ok(())
}

// --- Notes ---

pub async fn save_note(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(filename): Path<String>,
    Json(payload): Json<NoteInput>,
) -> Result<impl IntoResponse, AppError> {
    validate_filename(&filename)?;

    let note = OwnedNote {
        email: user.email,
        note: payload.note,
    };
    let body = serde_json::to_vec(&note)
        .map_err(|e| AppError::InternalWithMsg(format!("Failed to serialize note: {e}")))?;

    state.blob_store.put(&note_key(&filename), &body, "application/json").await?;

    Ok(Json(serde_json::json!({ "message": "Note saved successfully" })))
}

pub async fn get_note(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_filename(&filename)?;

    match state.blob_store.get(&note_key(&filename)).await? {
        Some(bytes) => {
            let note: OwnedNote = serde_json::from_slice(&bytes)
                .map_err(|e| AppError::InternalWithMsg(format!("Stored note unreadable: {e}")))?;
            if note.email != user.email {
                return Err(AppError::Forbidden("Not authorized to access this note".to_string()));
            }
            Ok(Json(serde_json::json!({ "note": note.note })))
        }
        None => Ok(Json(serde_json::json!({ "note": "" }))),
    }
}

// --- Tags ---

pub async fn save_tag(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(filename): Path<String>,
    Json(payload): Json<TagInput>,
) -> Result<impl IntoResponse, AppError> {
    validate_filename(&filename)?;

    let tag = OwnedTag {
        email: user.email,
        tag: payload.tag,
    };
    let body = serde_json::to_vec(&tag)
        .map_err(|e| AppError::InternalWithMsg(format!("Failed to serialize tag: {e}")))?;

    state.blob_store.put(&tag_key(&filename), &body, "application/json").await?;

    Ok(Json(serde_json::json!({ "message": "Tag saved successfully" })))
}

pub async fn get_tag(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_filename(&filename)?;

    match state.blob_store.get(&tag_key(&filename)).await? {
        Some(bytes) => {
            let tag: OwnedTag = serde_json::from_slice(&bytes)
                .map_err(|e| AppError::InternalWithMsg(format!("Stored tag unreadable: {e}")))?;
            if tag.email != user.email {
                return Err(AppError::Forbidden("Not authorized to access this tag".to_string()));
            }
            Ok(Json(serde_json::json!({ "tag": tag.tag })))
        }
        None => Ok(Json(serde_json::json!({ "tag": "" }))),
    }
}

// --- Quiz ---

pub async fn generate_quiz_question(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
    Json(payload): Json<QuizGenerateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let segment = payload.segment_text.trim();
    if segment.is_empty() {
        return Err(AppError::Validation("Segment text must not be empty".to_string()));
    }

    let prompt = format!(
        "You are a training assistant. Write one short comprehension question that \
checks whether a trainee understood the following transcript segment.\n\nSegment:\n{segment}\n\nQuestion:"
    );
    let question = state.llm.complete(&prompt).await?;

    if let Some(filename) = &payload.filename {
        validate_filename(filename)?;

        let key = quiz_key(filename);
        let mut quiz: Vec<QuizEntry> = match state.blob_store.get(&key).await? {
            Some(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
            None => Vec::new(),
        };

        quiz.push(QuizEntry {
            segment: segment.to_string(),
            question: question.clone(),
            timestamp: payload.timestamp,
        });

        let body = serde_json::to_vec(&quiz)
            .map_err(|e| AppError::InternalWithMsg(format!("Failed to serialize quiz: {e}")))?;
        state.blob_store.put(&key, &body, "application/json").await?;
    }

    Ok(Json(serde_json::json!({ "question": question })))
}

pub async fn get_quiz(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_filename(&filename)?;

    let quiz: Vec<QuizEntry> = match state.blob_store.get(&quiz_key(&filename)).await? {
        Some(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
        None => Vec::new(),
    };

    Ok(Json(serde_json::json!({ "quiz": quiz })))
}

pub async fn update_quiz_question(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
    Path(filename): Path<String>,
    Json(payload): Json<EditQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_filename(&filename)?;

    let key = quiz_key(&filename);
    let bytes = state
        .blob_store
        .get(&key)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz file not found".to_string()))?;
    let mut quiz: Vec<QuizEntry> = serde_json::from_slice(&bytes)
        .map_err(|e| AppError::InternalWithMsg(format!("Stored quiz unreadable: {e}")))?;

    let entry = quiz
        .iter_mut()
        .find(|q| (q.timestamp.unwrap_or(-1.0) - payload.timestamp).abs() < TIMESTAMP_EPSILON)
        .ok_or_else(|| AppError::NotFound("Quiz question with that timestamp not found".to_string()))?;
    entry.question = payload.new_question;

    let body = serde_json::to_vec(&quiz)
        .map_err(|e| AppError::InternalWithMsg(format!("Failed to serialize quiz: {e}")))?;
    state.blob_store.put(&key, &body, "application/json").await?;

    Ok(Json(serde_json::json!({ "message": "Quiz updated" })))
}

pub async fn delete_quiz_question(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
    Path((filename, timestamp)): Path<(String, f64)>,
) -> Result<impl IntoResponse, AppError> {
    validate_filename(&filename)?;

    let key = quiz_key(&filename);
    let bytes = state
        .blob_store
        .get(&key)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz file not found".to_string()))?;
    let quiz: Vec<QuizEntry> = serde_json::from_slice(&bytes)
        .map_err(|e| AppError::InternalWithMsg(format!("Stored quiz unreadable: {e}")))?;

    let initial_len = quiz.len();
    let remaining: Vec<QuizEntry> = quiz
        .into_iter()
        .filter(|q| (q.timestamp.unwrap_or(-1.0) - timestamp).abs() > TIMESTAMP_EPSILON)
        .collect();

    if remaining.len() == initial_len {
        return Err(AppError::NotFound("Quiz question with that timestamp not found".to_string()));
    }

    let body = serde_json::to_vec(&remaining)
        .map_err(|e| AppError::InternalWithMsg(format!("Failed to serialize quiz: {e}")))?;
    state.blob_store.put(&key, &body, "application/json").await?;

    Ok(Json(serde_json::json!({ "message": "Question deleted" })))
}

// --- Suggestions ---

pub async fn suggest_text(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
    Json(payload): Json<SuggestRequest>,
) -> Result<impl IntoResponse, AppError> {
    let text = payload.text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("Text must not be empty".to_string()));
    }

    let prompt = format!(
        "Improve the clarity and professionalism of the following text:\n\n\"{text}\"\n\nImproved:"
    );
    let suggestion = state.llm.complete(&prompt).await?;

    Ok(Json(serde_json::json!({ "suggestion": suggestion })))
}
