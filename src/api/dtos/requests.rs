use crate::domain::models::upload::TranscriptSegment;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub name: Option<String>,
    pub invite: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub password: String,
    pub code: String,
}

#[derive(Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Deserialize)]
pub struct NoteInput {
    pub note: String,
}

#[derive(Deserialize)]
pub struct TagInput {
    pub tag: String,
}

#[derive(Deserialize)]
pub struct QuizGenerateRequest {
    pub segment_text: String,
    pub filename: Option<String>,
    pub timestamp: Option<f64>,
}

#[derive(Deserialize)]
pub struct EditQuizRequest {
    pub timestamp: f64,
    pub new_question: String,
}

#[derive(Deserialize)]
pub struct SuggestRequest {
    pub text: String,
}

#[derive(Deserialize)]
pub struct SaveSegmentsRequest {
    pub segments: Vec<TranscriptSegment>,
}
