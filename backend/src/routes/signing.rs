//! PASSporT issuance.

use std::sync::Arc;

use axum::body::Bytes;
use axum::{Extension, Json};
use serde_json::{json, Value};

use passport::types::PassportHeader;
use passport::{b64, canonical, es256, identity};

use crate::middleware::TraceId;
use crate::state::CoreContext;
use crate::types::{AppError, Reason};
use crate::validation;

/// Validates the request, builds the SHAKEN header and canonical claims,
/// ES256-signs them, and returns the composite identity string.
pub async fn handler(
    Extension(ctx): Extension<Arc<CoreContext>>,
    Extension(TraceId(trace_id)): Extension<TraceId>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    ctx.stats.record_signing_request().await;

    if body.is_empty() {
        return Err(AppError::signing(Reason::EmptyBody));
    }
    let payload: Value =
        serde_json::from_slice(&body).map_err(|_| AppError::signing(Reason::MalformedBody))?;
    let request = validation::validate_sign_payload(&payload).map_err(AppError::signing)?;

    let material = ctx.signing_creds.current().await;
    let header = PassportHeader::shaken(material.x5u.clone());
    let header_bytes =
        serde_json::to_vec(&header).map_err(|_| AppError::signing(Reason::HeaderEncodeFailed))?;
    let claims = request.into_claims();
    let claims_bytes = canonical::claims_bytes(&claims)
        .map_err(|_| AppError::signing(Reason::ClaimsEncodeFailed))?;

    let signing_input = format!("{}.{}", b64::encode(&header_bytes), b64::encode(&claims_bytes));
    let signature = es256::sign(&signing_input, &material.key)
        .map_err(|_| AppError::signing(Reason::SigningFailed))?;
    let jwt = format!("{signing_input}.{}", b64::encode(&signature));
    let identity = identity::build(&jwt, &material.x5u);

    tracing::info!(%trace_id, x5u = %material.x5u, "issued identity");
    Ok(Json(json!({ "signingResponse": { "identity": identity } })))
}
