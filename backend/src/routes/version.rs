use axum::Json;
use serde_json::{json, Value};

/// Software version of the running service.
pub async fn handler() -> Json<Value> {
    Json(json!({ "version": concat!("Vesper Server ", env!("CARGO_PKG_VERSION")) }))
}
