use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A chunk retrieved from the vector index, in descending-score order.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SourceChunk {
    pub text: String,
    pub source: String,
    pub score: f32,
}

/// One finished question/answer exchange. Append-only; `sources_used`
/// holds the retrieved chunks as a JSON array.
#[derive(Debug, FromRow, Clone)]
pub struct QaRecord {
    pub id: String,
    pub email: String,
    pub question: String,
    pub answer: String,
    pub sources_used: String,
    pub timestamp: DateTime<Utc>,
}

impl QaRecord {
    pub fn new(email: String, question: String, answer: String, sources_used: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            question,
            answer,
            sources_used,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, FromRow)]
pub struct AskerCount {
    pub email: String,
    pub count: i64,
}
