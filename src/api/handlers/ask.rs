use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    response::sse::{Event, Sse},
    Json,
};
use futures_util::stream::{Stream, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::error;

use crate::api::dtos::requests::AskRequest;
use crate::api::extractors::auth::AuthUser;
use crate::api::handlers::{client_ip, log_activity};
use crate::background::BackgroundJob;
use crate::domain::services::qa_service::QaService;
use crate::error::AppError;
use crate::state::AppState;

/// POST /ask — retrieval-augmented answer streamed as SSE.
///
/// Emits one `sources` event, then a `token` event per completion delta.
/// A spawned producer drives the model stream so that the full answer
/// accumulates even if the client disconnects mid-stream; once the stream
/// ends (either way) the history write is handed to the background worker.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    headers: HeaderMap,
    Json(payload): Json<AskRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let question = payload.question.trim().to_string();
    if question.is_empty() {
        return Err(AppError::Validation("Question must not be empty".to_string()));
    }

    let sources = state.qa_service.retrieve(&question).await?;
    let prompt = QaService::build_prompt(&sources, &question);
    let llm_stream = state.llm.stream_complete(&prompt).await?;

    log_activity(&state, &user.email, "ask", None, client_ip(&headers)).await;

    let (tx, rx) = mpsc::channel::<Event>(32);
    let jobs = state.jobs.clone();
    let email = user.email.clone();
    let question_for_record = question.clone();
    let sources_for_record = sources.clone();

    tokio::spawn(async move {
        let sources_event = Event::default()
            .json_data(json!({ "type": "sources", "data": &sources_for_record }))
            .unwrap();

        // A send failure means the client is gone; the producer keeps its
        // accumulator and falls through to the history write.
        let mut client_connected = tx.send(sources_event).await.is_ok();

        let mut answer = String::new();
        let mut stream = llm_stream;

        while let Some(item) = stream.next().await {
            match item {
                Ok(token) => {
                    answer.push_str(&token);
                    if client_connected {
                        let event = Event::default()
                            .json_data(json!({ "type": "token", "data": token }))
                            .unwrap();
                        if tx.send(event).await.is_err() {
                            client_connected = false;
                        }
                    }
                }
                Err(e) => {
                    error!("Completion stream failed: {}", e);
                    break;
                }
            }
        }

        if !answer.trim().is_empty() {
            let _ = jobs.send(BackgroundJob::PersistQaRecord {
                email,
                question: question_for_record,
                answer,
                sources: sources_for_record,
            });
        }
    });

    let event_stream = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (Ok::<_, Infallible>(event), rx))
    });

    Ok(Sse::new(event_stream))
}
