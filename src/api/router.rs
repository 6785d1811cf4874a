use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Request},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{admin, annotation, ask, auth, health, qa_history, transcript, upload};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    let max_file_size = state.config.max_file_size;

    Router::new()
        .route("/health", get(health::health_check))

        // Auth
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh-token", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/reset-password", post(auth::reset_password))
        .route("/api/invite", post(auth::create_invite))

        // Upload & transcripts
        .route("/api/upload", post(upload::upload_file))
        .route("/api/transcripts", get(transcript::list_transcripts))
        .route("/api/transcript/{filename}", get(transcript::get_transcript))
        .route("/api/transcript/{filename}/segments", post(transcript::save_segments))
        .route("/api/share/{filename}", get(transcript::get_shared_transcript))
        .route("/api/delete/{filename}", delete(transcript::delete_transcript))
        .route("/api/download/all", get(transcript::download_all_transcripts))
        .route("/api/download/{filename}", get(transcript::download_transcript))

        // Notes & tags
        .route("/api/transcript/{filename}/note", post(annotation::save_note).get(annotation::get_note))
        .route("/api/transcript/{filename}/tag", post(annotation::save_tag).get(annotation::get_tag))

        // Quiz & suggestions
        .route("/api/quiz/generate", post(annotation::generate_quiz_question))
        .route("/api/quiz/{filename}", get(annotation::get_quiz).patch(annotation::update_quiz_question))
        .route("/api/quiz/{filename}/{timestamp}", delete(annotation::delete_quiz_question))
        .route("/api/suggest", post(annotation::suggest_text))

        // Q&A
        .route("/ask", post(ask::ask))
        .route("/api/qa-history", get(qa_history::get_qa_history))

        // Admin
        .route("/api/stats", get(admin::get_stats))
        .route("/api/activity-log", get(admin::get_activity_log))
        .route("/api/admin/analytics", get(admin::admin_analytics))
        .route("/api/admin/export-csv", get(admin::export_csv))

        .layer(DefaultBodyLimit::max(max_file_size))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_email = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
