pub mod admin;
pub mod annotation;
pub mod ask;
pub mod auth;
pub mod health;
pub mod qa_history;
pub mod transcript;
pub mod upload;

use std::sync::Arc;

use axum::http::HeaderMap;
use tracing::error;

use crate::domain::models::activity::ActivityLogEntry;
use crate::state::AppState;

/// First hop of X-Forwarded-For, when a proxy provided one.
pub(crate) fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Audit-trail append. Failures are logged, never surfaced: the trail is
/// best-effort and must not fail the triggering request.
pub(crate) async fn log_activity(
    state: &Arc<AppState>,
    email: &str,
    action: &str,
    filename: Option<String>,
    ip_address: Option<String>,
) {
    let entry = ActivityLogEntry::new(email.to_string(), action, filename, ip_address);
    if let Err(e) = state.activity_repo.append(&entry).await {
        error!("Failed to record {} activity: {}", action, e);
    }
}
