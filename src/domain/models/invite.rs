use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// One-time registration token. `used` flips false -> true exactly once;
/// consumption is guarded by a conditional UPDATE in the repository.
#[derive(Debug, FromRow, Clone)]
pub struct Invite {
    pub code: String,
    pub owner_id: String,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl Invite {
    pub fn new(code: String, owner_id: String) -> Self {
        Self {
            code,
            owner_id,
            used: false,
            created_at: Utc::now(),
        }
    }
}
