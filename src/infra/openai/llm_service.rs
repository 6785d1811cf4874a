use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{Stream, StreamExt};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{error, warn};

use crate::config::Config;
use crate::domain::ports::{LlmService, TokenStream};
use crate::error::AppError;

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;
const EMBED_TIMEOUT: Duration = Duration::from_secs(30);
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(30);
const STREAM_TIMEOUT: Duration = Duration::from_secs(300);

pub struct OpenAiService {
    client: Client,
    base_url: String,
    api_key: String,
    chat_model: String,
    embedding_model: String,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

impl OpenAiService {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            api_key: config.openai_api_key.clone(),
            chat_model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
        }
    }

    fn chat_request(&self, prompt: &str, stream: bool) -> ChatRequest {
        ChatRequest {
            model: self.chat_model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            stream,
        }
    }
}

#[async_trait]
impl LlmService for OpenAiService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let payload = EmbedRequest {
            model: self.embedding_model.clone(),
            input: vec![text.to_string()],
        };

        let mut retries = 0;
        let mut backoff = INITIAL_BACKOFF_MS;

        loop {
            let res = self
                .client
                .post(&url)
                .timeout(EMBED_TIMEOUT)
                .bearer_auth(&self.api_key)
                .json(&payload)
                .send()
                .await;

            match res {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body: EmbedResponse = response.json().await.map_err(|e| AppError::Dependency {
                            service: "embedding",
                            detail: format!("response decode failed: {e}"),
                        })?;
                        return body
                            .data
                            .into_iter()
                            .next()
                            .map(|d| d.embedding)
                            .ok_or(AppError::Dependency {
                                service: "embedding",
                                detail: "no embedding returned".to_string(),
                            });
                    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                        if retries >= MAX_RETRIES {
                            let text = response.text().await.unwrap_or_default();
                            error!("Embedding API failed after {} retries: {} {}", retries, status, text);
                            return Err(AppError::Dependency {
                                service: "embedding",
                                detail: format!("{status}: {text}"),
                            });
                        }
                        warn!("Embedding API transient error {}. Retrying in {}ms...", status, backoff);
                    } else {
                        let text = response.text().await.unwrap_or_default();
                        error!("Embedding API terminal error {}: {}", status, text);
                        return Err(AppError::Dependency {
                            service: "embedding",
                            detail: format!("{status}: {text}"),
                        });
                    }
                }
                Err(e) => {
                    if retries >= MAX_RETRIES {
                        error!("Embedding network error after {} retries: {:?}", retries, e);
                        return Err(AppError::Dependency {
                            service: "embedding",
                            detail: e.to_string(),
                        });
                    }
                    warn!("Embedding network error. Retrying in {}ms... {:?}", backoff, e);
                }
            }

            sleep(Duration::from_millis(backoff)).await;
            retries += 1;
            backoff *= 2;
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .timeout(COMPLETION_TIMEOUT)
            .bearer_auth(&self.api_key)
            .json(&self.chat_request(prompt, false))
            .send()
            .await
            .map_err(|e| AppError::Dependency {
                service: "completion",
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Dependency {
                service: "completion",
                detail: format!("{status}: {text}"),
            });
        }

        let body: ChatResponse = response.json().await.map_err(|e| AppError::Dependency {
            service: "completion",
            detail: format!("response decode failed: {e}"),
        })?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .ok_or(AppError::Dependency {
                service: "completion",
                detail: "response missing content".to_string(),
            })
    }

    async fn stream_complete(&self, prompt: &str) -> Result<TokenStream, AppError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .timeout(STREAM_TIMEOUT)
            .bearer_auth(&self.api_key)
            .json(&self.chat_request(prompt, true))
            .send()
            .await
            .map_err(|e| AppError::Dependency {
                service: "completion",
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Dependency {
                service: "completion",
                detail: format!("{status}: {text}"),
            });
        }

        let stream = stream_lines(response.bytes_stream()).filter_map(|line_result| async move {
            match line_result {
                Ok(line) => parse_sse_line(&line),
                Err(e) => Some(Err(e)),
            }
        });

        Ok(Box::pin(stream))
    }
}

/// Parse one SSE line from the completions stream. Returns:
/// - Some(Ok(content)) for content deltas
/// - Some(Err(e)) for parse errors
/// - None to skip (empty lines, [DONE], role-only chunks)
fn parse_sse_line(line: &str) -> Option<Result<String, AppError>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let data = line.strip_prefix("data: ")?.trim();

    if data == "[DONE]" {
        return None;
    }

    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => {
            let content = chunk
                .choices
                .first()
                .and_then(|c| c.delta.content.clone())
                .unwrap_or_default();
            if content.is_empty() {
                return None;
            }
            Some(Ok(content))
        }
        Err(e) => Some(Err(AppError::Dependency {
            service: "completion",
            detail: format!("failed to parse stream chunk: {e}"),
        })),
    }
}

/// Convert a byte stream into a stream of complete lines.
fn stream_lines(
    byte_stream: impl Stream<Item = reqwest::Result<bytes::Bytes>> + Send + 'static,
) -> impl Stream<Item = Result<String, AppError>> + Send {
    futures_util::stream::unfold(
        (Box::pin(byte_stream), String::new()),
        |(mut stream, mut buffer)| async move {
            loop {
                if let Some(newline_pos) = buffer.find('\n') {
                    let line = buffer[..newline_pos].to_string();
                    buffer = buffer[newline_pos + 1..].to_string();
                    if !line.trim().is_empty() {
                        return Some((Ok(line), (stream, buffer)));
                    }
                    continue;
                }

                match stream.next().await {
                    Some(Ok(bytes)) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                    }
                    Some(Err(e)) => {
                        return Some((
                            Err(AppError::Dependency {
                                service: "completion",
                                detail: format!("stream read error: {e}"),
                            }),
                            (stream, buffer),
                        ));
                    }
                    None => {
                        if !buffer.trim().is_empty() {
                            let remaining = std::mem::take(&mut buffer);
                            return Some((Ok(remaining), (stream, buffer)));
                        }
                        return None;
                    }
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data_line() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#;
        let result = parse_sse_line(line);
        assert_eq!(result.unwrap().unwrap(), "Hello");
    }

    #[test]
    fn test_parse_done() {
        assert!(parse_sse_line("data: [DONE]").is_none());
    }

    #[test]
    fn test_parse_empty_delta() {
        let line = r#"data: {"choices":[{"delta":{"content":null}}]}"#;
        assert!(parse_sse_line(line).is_none());
    }

    #[test]
    fn test_parse_role_only_chunk() {
        let line = r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert!(parse_sse_line(line).is_none());
    }

    #[test]
    fn test_parse_malformed() {
        let result = parse_sse_line("data: {broken json");
        assert!(result.unwrap().is_err());
    }

    #[test]
    fn test_parse_empty_and_non_data_lines() {
        assert!(parse_sse_line("").is_none());
        assert!(parse_sse_line("   ").is_none());
        assert!(parse_sse_line("event: message").is_none());
    }
}
