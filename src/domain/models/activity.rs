use serde::Serialize;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Append-only audit trail entry. Never mutated or deleted by the
/// application.
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct ActivityLogEntry {
    pub id: String,
    pub email: String,
    pub action: String,
    pub filename: Option<String>,
    pub ip_address: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ActivityLogEntry {
    pub fn new(
        email: String,
        action: &str,
        filename: Option<String>,
        ip_address: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            action: action.to_string(),
            filename,
            ip_address,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, FromRow)]
pub struct UserActivityCount {
    pub email: String,
    pub activity_count: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct ActionCount {
    pub action: String,
    pub count: i64,
}
