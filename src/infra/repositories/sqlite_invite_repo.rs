use crate::domain::{models::invite::Invite, ports::InviteRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteInviteRepo {
    pool: SqlitePool,
}

impl SqliteInviteRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InviteRepository for SqliteInviteRepo {
    async fn create(&self, invite: &Invite) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO invites (code, owner_id, used, created_at) VALUES (?, ?, ?, ?)",
        )
            .bind(&invite.code)
            .bind(&invite.owner_id)
            .bind(invite.used)
            .bind(invite.created_at)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn consume(&self, code: &str) -> Result<bool, AppError> {
        // Conditional update makes consumption idempotent-safe: only one
        // caller ever flips used from 0 to 1.
        let result = sqlx::query("UPDATE invites SET used = 1 WHERE code = ? AND used = 0")
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() == 1)
    }
}
