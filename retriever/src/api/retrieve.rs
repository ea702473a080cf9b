use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;
use warp::{Rejection, Reply};

use crate::error::{ApiError, RetrieverError};
use crate::metrics::Metrics;
use crate::models::{RetrieveRequest, RetrieveResponse};
use crate::retriever::Retriever;

pub async fn handle_retrieve(
    request: RetrieveRequest,
    retriever: Arc<dyn Retriever>,
    metrics: Metrics,
) -> Result<impl Reply, Rejection> {
    let request_id = Uuid::new_v4();
    info!("Processing retrieval [{}]: {}", request_id, request.query);

    match retriever
        .get_relevant_documents(&request.query, request.options.as_ref())
        .await
    {
        Ok(documents) => {
            metrics.record_success(documents.len());
            info!("Retrieval [{}] returned {} documents", request_id, documents.len());
            Ok(warp::reply::json(&RetrieveResponse {
                request_id,
                documents,
            }))
        }
        Err(e) => {
            metrics.record_failure();
            match &e {
                RetrieverError::EmptyQuery => warn!("Retrieval [{}] rejected: {}", request_id, e),
                _ => error!("Retrieval [{}] failed: {}", request_id, e),
            }
            Err(warp::reject::custom(ApiError::from(e)))
        }
    }
}
