use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::domain::models::qa::SourceChunk;
use crate::domain::ports::{ChunkVector, VectorIndex};
use crate::error::AppError;

const INDEX_TIMEOUT: Duration = Duration::from_secs(10);

/// REST adapter for a Pinecone-style vector index. Upserts are idempotent
/// by id; queries return matches in the index's descending-score order,
/// with ties broken however the remote index orders them.
pub struct PineconeIndex {
    client: Client,
    host: String,
    api_key: String,
}

#[derive(Serialize)]
struct UpsertVector {
    id: String,
    values: Vec<f32>,
    metadata: VectorMetadata,
}

#[derive(Serialize, Deserialize)]
struct VectorMetadata {
    text: String,
    source: String,
}

#[derive(Serialize)]
struct UpsertRequest {
    vectors: Vec<UpsertVector>,
}

#[derive(Serialize)]
struct QueryRequest {
    vector: Vec<f32>,
    #[serde(rename = "topK")]
    top_k: usize,
    #[serde(rename = "includeMetadata")]
    include_metadata: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    score: f32,
    metadata: Option<VectorMetadata>,
}

impl PineconeIndex {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            host: config.pinecone_index_host.trim_end_matches('/').to_string(),
            api_key: config.pinecone_api_key.clone(),
        }
    }

    async fn post<T: Serialize>(&self, path: &str, payload: &T) -> Result<reqwest::Response, AppError> {
        let response = self
            .client
            .post(format!("{}{}", self.host, path))
            .timeout(INDEX_TIMEOUT)
            .header("Api-Key", &self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::Dependency {
                service: "vector-index",
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Dependency {
                service: "vector-index",
                detail: format!("{status}: {text}"),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, entries: Vec<ChunkVector>) -> Result<(), AppError> {
        if entries.is_empty() {
            return Ok(());
        }

        let count = entries.len();
        let payload = UpsertRequest {
            vectors: entries
                .into_iter()
                .map(|e| UpsertVector {
                    id: e.id,
                    values: e.values,
                    metadata: VectorMetadata {
                        text: e.text,
                        source: e.source,
                    },
                })
                .collect(),
        };

        self.post("/vectors/upsert", &payload).await?;
        info!("Upserted {} vectors", count);
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<SourceChunk>, AppError> {
        let payload = QueryRequest {
            vector: vector.to_vec(),
            top_k,
            include_metadata: true,
        };

        let response = self.post("/query", &payload).await?;
        let body: QueryResponse = response.json().await.map_err(|e| AppError::Dependency {
            service: "vector-index",
            detail: format!("response decode failed: {e}"),
        })?;

        Ok(body
            .matches
            .into_iter()
            .map(|m| {
                let metadata = m.metadata.unwrap_or(VectorMetadata {
                    text: String::new(),
                    source: String::new(),
                });
                SourceChunk {
                    text: metadata.text,
                    source: metadata.source,
                    score: m.score,
                }
            })
            .collect())
    }
}
