//! Per-request latency recording for the stats endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use axum::Extension;

use crate::state::CoreContext;

pub async fn timing_middleware(
    Extension(ctx): Extension<Arc<CoreContext>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed_ms = i64::try_from(start.elapsed().as_millis()).unwrap_or(i64::MAX);
    ctx.stats.record_processing_time(elapsed_ms).await;
    response
}
