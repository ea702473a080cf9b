//! Hybrid (keyword + vector) search retriever for retrieval pipelines.
//!
//! [`HybridSearchRetriever`] embeds a query through an [`Embeddings`]
//! provider, runs one hybrid search against a [`HybridStore`] and returns
//! the hits as [`Document`]s in the store's relevance order.

pub mod api;
pub mod config;
pub mod document;
pub mod embeddings;
pub mod error;
pub mod mapper;
pub mod metrics;
pub mod models;
pub mod retriever;
pub mod store;

pub use document::Document;
pub use embeddings::{Embeddings, HttpEmbeddings};
pub use error::{EmbeddingError, Result, RetrieverError, StoreError};
pub use retriever::{HybridSearchRetriever, Retriever, RetrieverConfig, SearchOptions};
pub use store::{CollectionSchema, HybridQuery, HybridStore, PropertySchema, SearchObject, WeaviateClient};
