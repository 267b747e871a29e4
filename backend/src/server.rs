//! HTTP server assembly and lifecycle.

use std::sync::Arc;

use axum::Extension;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::Level;

use crate::middleware;
use crate::routes;
use crate::state::CoreContext;

/// Builds the service router with all layers applied.
pub fn router(ctx: Arc<CoreContext>) -> axum::Router {
    routes::handler()
        .layer(axum::middleware::from_fn(middleware::trace_id_middleware))
        .layer(Extension(ctx))
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(tower_http::trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(tower_http::trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(tower_http::timeout::TimeoutLayer::new(
            std::time::Duration::from_secs(15),
        ))
}

/// Starts the server; in-flight requests drain when `shutdown` fires,
/// bounded by the per-request timeout layer.
pub async fn start(ctx: Arc<CoreContext>, shutdown: CancellationToken) -> anyhow::Result<()> {
    let host = if ctx.config.http_host.is_empty() {
        "0.0.0.0"
    } else {
        ctx.config.http_host.as_str()
    };
    let addr = format!("{host}:{}", ctx.config.http_port);
    let router = router(ctx);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("vesper listening on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(anyhow::Error::from)
}
