use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::api::extractors::auth::OwnerUser;
use crate::error::AppError;
use crate::state::AppState;

const ACTIVITY_PAGE_SIZE: i64 = 100;
const TOP_ASKERS_LIMIT: i64 = 10;

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    OwnerUser(_admin): OwnerUser,
) -> Result<impl IntoResponse, AppError> {
    let user_activity = state.activity_repo.counts_by_user().await?;
    let file_statistics = state.file_repo.size_stats().await?;

    let seven_days_ago = Utc::now() - Duration::days(7);
    let recent_activity = state.activity_repo.counts_by_action_since(seven_days_ago).await?;

    Ok(Json(serde_json::json!({
        "user_activity": user_activity,
        "file_statistics": file_statistics,
        "recent_activity": recent_activity,
    })))
}

pub async fn get_activity_log(
    State(state): State<Arc<AppState>>,
    OwnerUser(_admin): OwnerUser,
) -> Result<impl IntoResponse, AppError> {
    let entries = state.activity_repo.list_recent(ACTIVITY_PAGE_SIZE).await?;

    let log: Vec<serde_json::Value> = entries
        .into_iter()
        .map(|e| {
            serde_json::json!({
                "email": e.email,
                "action": e.action,
                "filename": e.filename,
                "timestamp": e.timestamp.to_rfc3339(),
                "ip_address": e.ip_address,
            })
        })
        .collect();

    Ok(Json(serde_json::json!({ "log": log })))
}

pub async fn admin_analytics(
    State(state): State<Arc<AppState>>,
    OwnerUser(_admin): OwnerUser,
) -> Result<impl IntoResponse, AppError> {
    let total_users = state.user_repo.count().await?;
    let total_files = state.file_repo.count().await?;
    let total_questions = state.qa_repo.count().await?;
    let top_users = state.qa_repo.top_askers(TOP_ASKERS_LIMIT).await?;

    Ok(Json(serde_json::json!({
        "total_users": total_users,
        "total_files": total_files,
        "total_questions": total_questions,
        "top_users": top_users,
    })))
}

pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    OwnerUser(_admin): OwnerUser,
) -> Result<impl IntoResponse, AppError> {
    let rows = state.file_repo.export_rows().await?;

    let mut csv = String::from("Email,Filename,Uploaded At\n");
    for row in rows {
        csv.push_str(&format!(
            "{},{},{}\n",
            csv_escape(&row.email),
            csv_escape(&row.filename),
            row.upload_timestamp.format("%Y-%m-%d %H:%M:%S"),
        ));
    }

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=admin_data_export.csv".to_string(),
            ),
        ],
        csv,
    ))
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_escape_plain() {
        assert_eq!(csv_escape("a@x.com"), "a@x.com");
    }

    #[test]
    fn test_csv_escape_comma_and_quote() {
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
