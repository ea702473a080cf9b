//! Backing store abstraction for hybrid search.

mod weaviate;

pub use weaviate::WeaviateClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// A single property declaration in a collection schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    pub name: String,
    #[serde(rename = "dataType")]
    pub data_type: Vec<String>,
}

impl PropertySchema {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: vec!["text".to_string()],
        }
    }
}

/// Collection definition in the shape Weaviate's schema endpoint accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub class: String,
    #[serde(default)]
    pub properties: Vec<PropertySchema>,
}

impl CollectionSchema {
    /// Schema with a single text property.
    pub fn with_text_field(class: impl Into<String>, text_key: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            properties: vec![PropertySchema::text(text_key)],
        }
    }
}

/// One hybrid search request.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridQuery {
    pub collection: String,
    /// Raw query text, used for lexical scoring.
    pub query: String,
    /// Query embedding, used for vector scoring.
    pub vector: Vec<f32>,
    /// 0 is pure keyword search, 1 is pure vector search.
    pub alpha: f32,
    pub limit: usize,
    /// Engine-specific parameters passed through as-is.
    pub extra: Map<String, Value>,
}

/// A raw result record returned by the store.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SearchObject {
    pub properties: Map<String, Value>,
}

impl SearchObject {
    pub fn new(properties: Map<String, Value>) -> Self {
        Self { properties }
    }
}

/// Operations the retriever needs from a search backend.
///
/// Results from [`HybridStore::hybrid`] must already be in relevance order.
#[async_trait]
pub trait HybridStore: Send + Sync {
    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError>;

    async fn create_collection(&self, schema: &CollectionSchema) -> Result<(), StoreError>;

    async fn hybrid(&self, query: &HybridQuery) -> Result<Vec<SearchObject>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schema_serializes_with_weaviate_keys() {
        let schema = CollectionSchema::with_text_field("Passage", "content");
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({
                "class": "Passage",
                "properties": [{ "name": "content", "dataType": ["text"] }]
            })
        );
    }
}
