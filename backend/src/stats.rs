//! Request counters and the API processing-time histogram.

use serde_json::{json, Map, Value};
use tokio::sync::RwLock;

/// Histogram bucket upper bounds in milliseconds, paired with the labels
/// the stats endpoint has always reported.
const BUCKETS: [(i64, &str); 7] = [
    (25, "processingTime (0 - 25ms)"),
    (50, "processingTime (26 - 50ms)"),
    (100, "processingTime (51 - 100ms)"),
    (150, "processingTime (101 - 150ms)"),
    (300, "processingTime (151 - 300ms)"),
    (600, "processingTime (301 - 600ms)"),
    (1000, "processingTime (601 - 1000ms)"),
];
const OVERFLOW_LABEL: &str = "processingTime (more than 1000ms)";

#[derive(Default)]
struct Counters {
    signing_requests: u64,
    verification_requests: u64,
    min_processing_ms: i64,
    max_processing_ms: i64,
    buckets: [u64; BUCKETS.len() + 1],
}

#[derive(Default)]
pub struct ApiStats {
    inner: RwLock<Counters>,
}

impl ApiStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_signing_request(&self) {
        self.inner.write().await.signing_requests += 1;
    }

    pub async fn record_verification_request(&self) {
        self.inner.write().await.verification_requests += 1;
    }

    pub async fn record_processing_time(&self, elapsed_ms: i64) {
        let mut counters = self.inner.write().await;
        let index = BUCKETS
            .iter()
            .position(|&(bound, _)| elapsed_ms <= bound)
            .unwrap_or(BUCKETS.len());
        counters.buckets[index] += 1;
        if counters.min_processing_ms == 0 && counters.max_processing_ms == 0 {
            counters.min_processing_ms = elapsed_ms;
            counters.max_processing_ms = elapsed_ms;
        } else if elapsed_ms < counters.min_processing_ms {
            counters.min_processing_ms = elapsed_ms;
        } else if elapsed_ms > counters.max_processing_ms {
            counters.max_processing_ms = elapsed_ms;
        }
    }

    /// Snapshot of all counters. Processing-time detail is included only
    /// once at least one request was seen.
    pub async fn snapshot(&self) -> Value {
        let counters = self.inner.read().await;
        let mut out = Map::new();
        out.insert("signingRequests".to_owned(), json!(counters.signing_requests));
        out.insert(
            "verificationRequests".to_owned(),
            json!(counters.verification_requests),
        );
        if counters.signing_requests > 0 || counters.verification_requests > 0 {
            out.insert(
                "minApiProcessingTime".to_owned(),
                json!(counters.min_processing_ms),
            );
            out.insert(
                "maxApiProcessingTime".to_owned(),
                json!(counters.max_processing_ms),
            );
            let total: u64 = counters.buckets.iter().sum();
            let labels = BUCKETS
                .iter()
                .map(|&(_, label)| label)
                .chain(std::iter::once(OVERFLOW_LABEL));
            for (label, &count) in labels.zip(&counters.buckets) {
                let percentage = if total == 0 {
                    0.0
                } else {
                    (count as f64 / total as f64) * 100.0
                };
                out.insert(
                    label.to_owned(),
                    json!({ "count": count, "percentage": percentage }),
                );
            }
        }
        Value::Object(out)
    }

    pub async fn reset(&self) {
        *self.inner.write().await = Counters::default();
    }
}
