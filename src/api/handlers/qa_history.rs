use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::dtos::responses::{QaHistoryItem, QaHistoryResponse};
use crate::api::extractors::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Newest-first page of the caller's exchanges.
const HISTORY_PAGE_SIZE: i64 = 50;

pub async fn get_qa_history(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let records = state.qa_repo.list_recent(&user.email, HISTORY_PAGE_SIZE).await?;

    let history: Vec<QaHistoryItem> = records
        .into_iter()
        .map(|r| QaHistoryItem {
            question: r.question,
            answer: r.answer,
            timestamp: r.timestamp,
            // Rows written by older builds may hold malformed JSON; an
            // unreadable sources column degrades to an empty list.
            sources_used: serde_json::from_str(&r.sources_used)
                .unwrap_or_else(|_| serde_json::Value::Array(Vec::new())),
        })
        .collect();

    Ok(Json(QaHistoryResponse { history }))
}
