use std::sync::Arc;

use axum::{Extension, Json};
use serde_json::Value;

use crate::state::CoreContext;

pub async fn get_handler(Extension(ctx): Extension<Arc<CoreContext>>) -> Json<Value> {
    Json(ctx.stats.snapshot().await)
}

pub async fn reset_handler(Extension(ctx): Extension<Arc<CoreContext>>) -> Json<Value> {
    ctx.stats.reset().await;
    Json(serde_json::json!({}))
}
