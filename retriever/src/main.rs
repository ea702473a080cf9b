use std::sync::Arc;

use tracing::info;
use warp::Filter;

use hybrid_retriever::api;
use hybrid_retriever::config::Settings;
use hybrid_retriever::error::handle_rejection;
use hybrid_retriever::metrics::Metrics;
use hybrid_retriever::{HttpEmbeddings, HybridSearchRetriever, Retriever, WeaviateClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let settings = Settings::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .json()
        .init();

    info!("Starting hybrid search retriever");

    let mut weaviate = WeaviateClient::new(&settings.weaviate_url);
    if let Some(key) = &settings.weaviate_api_key {
        weaviate = weaviate.with_api_key(key);
    }
    let embeddings = HttpEmbeddings::new(&settings.embedding_service_url);

    let retriever = HybridSearchRetriever::init(
        Arc::new(weaviate),
        Arc::new(embeddings),
        settings.retriever_config(),
    )
    .await?;
    info!(
        "Retriever ready on collection '{}' (alpha={}, k={})",
        retriever.config().index_name,
        retriever.config().alpha,
        retriever.config().k
    );
    let retriever: Arc<dyn Retriever> = Arc::new(retriever);

    let metrics = Metrics::new(prometheus::default_registry())?;

    let api_routes = api::routes(retriever, metrics)
        .with(warp::log("api"))
        .recover(handle_rejection);

    // Health check route
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({"status": "healthy"})));

    // Metrics route
    let metrics_route = warp::path("metrics").and(warp::get()).map(|| {
        use prometheus::{Encoder, TextEncoder};
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = vec![];
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
        }
        warp::reply::with_header(buffer, "Content-Type", encoder.format_type())
    });

    let routes = health.or(metrics_route).or(api_routes);

    // Start server
    let addr = ([0, 0, 0, 0], settings.port);
    info!("Server listening on {}", addr.1);

    warp::serve(routes).run(addr).await;

    Ok(())
}
