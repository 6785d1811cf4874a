use crate::domain::{
    models::qa::{AskerCount, QaRecord},
    ports::QaRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteQaRepo {
    pool: SqlitePool,
}

impl SqliteQaRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QaRepository for SqliteQaRepo {
    async fn create(&self, record: &QaRecord) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO qa_history (id, email, question, answer, sources_used, timestamp) VALUES (?, ?, ?, ?, ?, ?)",
        )
            .bind(&record.id)
            .bind(&record.email)
            .bind(&record.question)
            .bind(&record.answer)
            .bind(&record.sources_used)
            .bind(record.timestamp)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn list_recent(&self, email: &str, limit: i64) -> Result<Vec<QaRecord>, AppError> {
        sqlx::query_as::<_, QaRecord>(
            "SELECT id, email, question, answer, sources_used, timestamp FROM qa_history WHERE email = ? ORDER BY timestamp DESC LIMIT ?",
        )
            .bind(email)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn count(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM qa_history")
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn top_askers(&self, limit: i64) -> Result<Vec<AskerCount>, AppError> {
        sqlx::query_as::<_, AskerCount>(
            "SELECT email, COUNT(*) AS count FROM qa_history GROUP BY email ORDER BY count DESC LIMIT ?",
        )
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
