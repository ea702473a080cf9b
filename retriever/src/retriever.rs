// Retriever: hybrid keyword + vector search over a backing store

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::document::Document;
use crate::embeddings::Embeddings;
use crate::error::{EmbeddingError, Result, RetrieverError};
use crate::mapper;
use crate::store::{CollectionSchema, HybridQuery, HybridStore};

/// Engine-specific parameters merged into a single search request.
pub type SearchOptions = Map<String, Value>;

/// Anything a retrieval pipeline can ask for relevant documents.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn get_relevant_documents(
        &self,
        query: &str,
        options: Option<&SearchOptions>,
    ) -> Result<Vec<Document>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieverConfig {
    /// Collection to search.
    pub index_name: String,
    /// Property holding the passage text.
    pub text_key: String,
    /// Blend weight, 0 is pure keyword and 1 is pure vector.
    pub alpha: f32,
    /// Number of results to request.
    pub k: usize,
}

impl RetrieverConfig {
    pub const DEFAULT_ALPHA: f32 = 0.5;
    pub const DEFAULT_K: usize = 4;

    pub fn new(index_name: impl Into<String>, text_key: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            text_key: text_key.into(),
            alpha: Self::DEFAULT_ALPHA,
            k: Self::DEFAULT_K,
        }
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.index_name.trim().is_empty() {
            return Err(RetrieverError::Config("index_name must not be empty".into()));
        }
        if self.text_key.trim().is_empty() {
            return Err(RetrieverError::Config("text_key must not be empty".into()));
        }
        if !self.alpha.is_finite() || !(0.0..=1.0).contains(&self.alpha) {
            return Err(RetrieverError::Config(format!(
                "alpha must be within [0, 1], got {}",
                self.alpha
            )));
        }
        if self.k == 0 {
            return Err(RetrieverError::Config("k must be at least 1".into()));
        }
        Ok(())
    }
}

/// Hybrid search retriever bound to one collection of a [`HybridStore`].
pub struct HybridSearchRetriever<S> {
    client: Arc<S>,
    embedding: Arc<dyn Embeddings>,
    config: RetrieverConfig,
}

impl<S: HybridStore> HybridSearchRetriever<S> {
    /// Validates `config` and makes sure the collection exists, creating it
    /// with a single text property when it does not.
    pub async fn init(
        client: Arc<S>,
        embedding: Arc<dyn Embeddings>,
        config: RetrieverConfig,
    ) -> Result<Self> {
        config.validate()?;

        if client.collection_exists(&config.index_name).await? {
            debug!(index = %config.index_name, "Collection already exists");
        } else {
            let schema = CollectionSchema::with_text_field(&config.index_name, &config.text_key);
            client.create_collection(&schema).await?;
            info!(
                index = %config.index_name,
                text_key = %config.text_key,
                "Created collection"
            );
        }

        Ok(Self {
            client,
            embedding,
            config,
        })
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    #[instrument(skip(self, options), fields(index = %self.config.index_name))]
    pub async fn search(&self, query: &str, options: Option<&SearchOptions>) -> Result<Vec<Document>> {
        if query.trim().is_empty() {
            return Err(RetrieverError::EmptyQuery);
        }

        let vector = self.embedding.embed_query(query).await?;
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(EmbeddingError::NonFinite.into());
        }

        let request = HybridQuery {
            collection: self.config.index_name.clone(),
            query: query.to_string(),
            vector,
            alpha: self.config.alpha,
            limit: self.config.k,
            extra: options.cloned().unwrap_or_default(),
        };
        debug!(
            alpha = request.alpha,
            limit = request.limit,
            dimension = request.vector.len(),
            "Issuing hybrid search"
        );

        let objects = self.client.hybrid(&request).await?;
        let documents = mapper::to_documents(&objects, &self.config.text_key)?;
        debug!(count = documents.len(), "Hybrid search returned");
        Ok(documents)
    }
}

#[async_trait]
impl<S: HybridStore> Retriever for HybridSearchRetriever<S> {
    async fn get_relevant_documents(
        &self,
        query: &str,
        options: Option<&SearchOptions>,
    ) -> Result<Vec<Document>> {
        self.search(query, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_hybrid_search_conventions() {
        let config = RetrieverConfig::new("Passage", "text");
        assert_eq!(config.alpha, 0.5);
        assert_eq!(config.k, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_settings() {
        let cases = vec![
            RetrieverConfig::new("", "text"),
            RetrieverConfig::new("Passage", " "),
            RetrieverConfig::new("Passage", "text").with_alpha(1.5),
            RetrieverConfig::new("Passage", "text").with_alpha(f32::NAN),
            RetrieverConfig::new("Passage", "text").with_k(0),
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(RetrieverError::Config(_))),
                "{:?} should be rejected",
                config
            );
        }
    }

    #[test]
    fn boundary_alphas_are_accepted() {
        assert!(RetrieverConfig::new("P", "t").with_alpha(0.0).validate().is_ok());
        assert!(RetrieverConfig::new("P", "t").with_alpha(1.0).validate().is_ok());
    }
}
