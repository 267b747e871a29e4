//! Route assembly.

mod signing;
mod stats;
mod verification;
mod version;

use axum::routing::{get, post};
use axum::Router;

/// Creates the router with all handler routes. The two STIR endpoints get
/// the latency-recording layer; the operational endpoints do not.
pub fn handler() -> Router {
    let stir = Router::new()
        .route("/stir/v1/signing", post(signing::handler))
        .route("/stir/v1/verification", post(verification::handler))
        .layer(axum::middleware::from_fn(
            crate::middleware::timing_middleware,
        ));

    Router::new()
        .merge(stir)
        .route("/v1/version", get(version::handler))
        .route("/v1/stats", get(stats::get_handler))
        .route("/v1/stats/reset", post(stats::reset_handler))
}
