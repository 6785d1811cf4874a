use crate::domain::{
    models::activity::{ActionCount, ActivityLogEntry, UserActivityCount},
    ports::ActivityLogRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteActivityRepo {
    pool: SqlitePool,
}

impl SqliteActivityRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLogRepository for SqliteActivityRepo {
    async fn append(&self, entry: &ActivityLogEntry) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO activity_log (id, email, action, filename, ip_address, timestamp) VALUES (?, ?, ?, ?, ?, ?)",
        )
            .bind(&entry.id)
            .bind(&entry.email)
            .bind(&entry.action)
            .bind(&entry.filename)
            .bind(&entry.ip_address)
            .bind(entry.timestamp)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<ActivityLogEntry>, AppError> {
        sqlx::query_as::<_, ActivityLogEntry>(
            "SELECT id, email, action, filename, ip_address, timestamp FROM activity_log ORDER BY timestamp DESC LIMIT ?",
        )
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn counts_by_user(&self) -> Result<Vec<UserActivityCount>, AppError> {
        sqlx::query_as::<_, UserActivityCount>(
            "SELECT email, COUNT(*) AS activity_count FROM activity_log GROUP BY email ORDER BY activity_count DESC",
        )
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn counts_by_action_since(&self, since: DateTime<Utc>) -> Result<Vec<ActionCount>, AppError> {
        sqlx::query_as::<_, ActionCount>(
            "SELECT action, COUNT(*) AS count FROM activity_log WHERE timestamp > ? GROUP BY action ORDER BY count DESC",
        )
            .bind(since)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
