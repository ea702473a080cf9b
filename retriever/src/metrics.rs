use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts, Registry};

/// Retrieval counters exposed on `/metrics`.
#[derive(Clone)]
pub struct Metrics {
    requests: IntCounterVec,
    documents_returned: Histogram,
}

impl Metrics {
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let requests = IntCounterVec::new(
            Opts::new("retriever_requests_total", "Retrieval requests by outcome"),
            &["outcome"],
        )?;
        let documents_returned = Histogram::with_opts(
            HistogramOpts::new(
                "retriever_documents_returned",
                "Documents returned per successful retrieval",
            )
            .buckets(vec![0.0, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0]),
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(documents_returned.clone()))?;

        Ok(Self {
            requests,
            documents_returned,
        })
    }

    pub fn record_success(&self, documents: usize) {
        self.requests.with_label_values(&["ok"]).inc();
        self.documents_returned.observe(documents as f64);
    }

    pub fn record_failure(&self) {
        self.requests.with_label_values(&["error"]).inc();
    }
}
