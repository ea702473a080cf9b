//! Embedding providers.
//!
//! The retriever only needs one operation from a provider: turn the query
//! text into a vector. [`HttpEmbeddings`] talks to the embedding service
//! used at ingestion time, so queries and passages share a model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EmbeddingError;

/// Converts query text into an embedding vector.
#[async_trait]
pub trait Embeddings: Send + Sync {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    texts: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Client for an embedding service exposing `POST /embed`.
#[derive(Debug, Clone)]
pub struct HttpEmbeddings {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEmbeddings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Embeddings for HttpEmbeddings {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let resp = self
            .client
            .post(format!("{}/embed", self.base_url))
            .json(&EmbedRequest { texts: [text] })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: EmbedResponse = resp.json().await?;
        let vector = data
            .embeddings
            .into_iter()
            .next()
            .ok_or(EmbeddingError::EmptyResponse)?;
        debug!(dimension = vector.len(), "Embedded query");
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use warp::Filter;

    fn spawn_embed_service(reply: Value, status: u16) -> String {
        let route = warp::path("embed")
            .and(warp::post())
            .and(warp::body::json())
            .map(move |body: Value| {
                assert_eq!(body, json!({ "texts": ["what is rust"] }));
                warp::reply::with_status(
                    warp::reply::json(&reply),
                    warp::http::StatusCode::from_u16(status).unwrap(),
                )
            });
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn returns_first_vector() {
        let url = spawn_embed_service(json!({ "embeddings": [[0.25, -1.0, 3.5]] }), 200);
        let embeddings = HttpEmbeddings::new(format!("{}/", url));

        let vector = embeddings.embed_query("what is rust").await.unwrap();
        assert_eq!(vector, vec![0.25, -1.0, 3.5]);
    }

    #[tokio::test]
    async fn empty_embedding_list_is_an_error() {
        let url = spawn_embed_service(json!({ "embeddings": [] }), 200);
        let embeddings = HttpEmbeddings::new(url);

        let err = embeddings.embed_query("what is rust").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::EmptyResponse));
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let url = spawn_embed_service(json!({ "detail": "model not loaded" }), 503);
        let embeddings = HttpEmbeddings::new(url);

        match embeddings.embed_query("what is rust").await {
            Err(EmbeddingError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert!(body.contains("model not loaded"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }
}
