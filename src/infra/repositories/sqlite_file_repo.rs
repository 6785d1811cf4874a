use crate::domain::{
    models::upload::{FileExportRow, FileStats, UploadedFile},
    ports::FileRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::error;

pub struct SqliteFileRepo {
    pool: SqlitePool,
}

impl SqliteFileRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for SqliteFileRepo {
    async fn create(&self, file: &UploadedFile) -> Result<UploadedFile, AppError> {
        sqlx::query_as::<_, UploadedFile>(
            "INSERT INTO user_files (id, user_id, filename, file_size, upload_timestamp, audio_url, transcript_url) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id, user_id, filename, file_size, upload_timestamp, audio_url, transcript_url",
        )
            .bind(&file.id)
            .bind(&file.user_id)
            .bind(&file.filename)
            .bind(file.file_size)
            .bind(file.upload_timestamp)
            .bind(&file.audio_url)
            .bind(&file.transcript_url)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_filename(&self, user_id: &str, filename: &str) -> Result<Option<UploadedFile>, AppError> {
        sqlx::query_as::<_, UploadedFile>(
            "SELECT id, user_id, filename, file_size, upload_timestamp, audio_url, transcript_url FROM user_files WHERE user_id = ? AND filename = ?",
        )
            .bind(user_id)
            .bind(filename)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<UploadedFile>, AppError> {
        sqlx::query_as::<_, UploadedFile>(
            "SELECT id, user_id, filename, file_size, upload_timestamp, audio_url, transcript_url FROM user_files WHERE user_id = ? ORDER BY upload_timestamp DESC",
        )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM user_files WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("File row deletion failed: {:?}", e);
                AppError::Database(e)
            })?;
        Ok(())
    }

    async fn count(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_files")
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn size_stats(&self) -> Result<FileStats, AppError> {
        sqlx::query_as::<_, FileStats>(
            "SELECT COUNT(*) AS total_files, COALESCE(SUM(file_size), 0) AS total_size, COALESCE(AVG(file_size), 0.0) AS avg_size FROM user_files",
        )
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn export_rows(&self) -> Result<Vec<FileExportRow>, AppError> {
        sqlx::query_as::<_, FileExportRow>(
            "SELECT u.email AS email, f.filename AS filename, f.upload_timestamp AS upload_timestamp FROM user_files f JOIN users u ON u.id = f.user_id ORDER BY f.upload_timestamp DESC",
        )
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
