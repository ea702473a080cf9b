use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::Document;
use crate::retriever::SearchOptions;

// API Request/Response models
#[derive(Debug, Deserialize)]
pub struct RetrieveRequest {
    pub query: String,
    #[serde(default)]
    pub options: Option<SearchOptions>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RetrieveResponse {
    pub request_id: Uuid,
    pub documents: Vec<Document>,
}
