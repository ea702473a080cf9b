use thiserror::Error;
use warp::{reject::Reject, Rejection, Reply};

/// Failures from an embedding provider.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Embedding service returned no vectors")]
    EmptyResponse,

    #[error("Embedding contains non-finite values")]
    NonFinite,

    #[error("Embedding provider error: {0}")]
    Provider(String),
}

/// Failures from the backing search store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Query error: {0}")]
    Query(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum RetrieverError {
    #[error("Invalid retriever configuration: {0}")]
    Config(String),

    #[error("Query must not be empty")]
    EmptyQuery,

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Result is missing text field '{key}'")]
    MissingTextField { key: String },

    #[error("Text field '{key}' is not a string")]
    InvalidTextField { key: String },
}

pub type Result<T, E = RetrieverError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] RetrieverError),
}

impl Reject for ApiError {}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Retrieval(RetrieverError::EmptyQuery) => 400,
            ApiError::Retrieval(RetrieverError::Embedding(_))
            | ApiError::Retrieval(RetrieverError::Store(_)) => 502,
            _ => 500,
        }
    }
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(api_err) = err.find::<ApiError>() {
        let code = api_err.status_code();
        let message = match code {
            400 => "Bad request",
            502 => "Upstream service error",
            _ => "Internal server error",
        };

        let json = warp::reply::json(&serde_json::json!({
            "error": message,
            "details": api_err.to_string(),
        }));

        let status = warp::http::StatusCode::from_u16(code)
            .unwrap_or(warp::http::StatusCode::INTERNAL_SERVER_ERROR);
        Ok(warp::reply::with_status(json, status))
    } else {
        Err(err)
    }
}
