use std::sync::Arc;

use warp::{Filter, Rejection, Reply};

use crate::metrics::Metrics;
use crate::retriever::Retriever;

mod retrieve;

pub fn routes(
    retriever: Arc<dyn Retriever>,
    metrics: Metrics,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let api = warp::path("api").and(warp::path("v1"));

    api.and(warp::path("retrieve"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(64 * 1024))
        .and(warp::body::json())
        .and(with_retriever(retriever))
        .and(with_metrics(metrics))
        .and_then(retrieve::handle_retrieve)
}

fn with_retriever(
    retriever: Arc<dyn Retriever>,
) -> impl Filter<Extract = (Arc<dyn Retriever>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || retriever.clone())
}

fn with_metrics(
    metrics: Metrics,
) -> impl Filter<Extract = (Metrics,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || metrics.clone())
}
