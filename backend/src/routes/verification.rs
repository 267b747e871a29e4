//! PASSporT verification.

use std::sync::Arc;

use axum::body::Bytes;
use axum::{Extension, Json};
use chrono::Utc;
use serde_json::{json, Value};

use passport::chain::{self, ChainError};
use passport::identity::{IdentityError, IdentityParts, JwtSegments};
use passport::{b64, canonical, es256, VerifyingKey};

use crate::middleware::TraceId;
use crate::state::CoreContext;
use crate::types::{AppError, Reason};
use crate::validation::{self, VerifyRequest};

/// Parses the composite identity, validates the JWT's header and claims,
/// cross-checks them against the request, fetches and chain-verifies the
/// signing certificate, verifies the ES256 signature, and records the
/// claim set in the replay cache.
pub async fn handler(
    Extension(ctx): Extension<Arc<CoreContext>>,
    Extension(TraceId(trace_id)): Extension<TraceId>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    ctx.stats.record_verification_request().await;

    if body.is_empty() {
        return Err(AppError::verification(Reason::VerifyEmptyBody));
    }
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| AppError::verification(Reason::VerifyMalformedBody))?;
    let request = validation::validate_verify_payload(&payload).map_err(AppError::verification)?;

    let now = Utc::now().timestamp();
    let record = verify_identity(&ctx, &request, now).await?;
    tracing::info!(%trace_id, "verified identity");
    Ok(Json(record))
}

async fn verify_identity(
    ctx: &CoreContext,
    request: &VerifyRequest,
    now: i64,
) -> Result<Value, AppError> {
    let parts = IdentityParts::try_from(request.identity.as_str())
        .map_err(|e| AppError::verification(identity_reason(e)))?;
    let segments = JwtSegments::try_from(parts.jwt)
        .map_err(|_| AppError::verification(Reason::JwtNotThreeSegments))?;

    let header_bytes = b64::decode(segments.header_b64)
        .map_err(|_| AppError::verification(Reason::HeaderNotBase64))?;
    let header_value: Value = serde_json::from_slice(&header_bytes)
        .map_err(|_| AppError::verification(Reason::HeaderNotJson))?;
    let header =
        validation::validate_passport_header(&header_value).map_err(AppError::verification)?;
    if header.x5u != parts.info_url {
        return Err(AppError::verification(Reason::X5uInfoMismatch));
    }

    let claims_bytes = b64::decode(segments.claims_b64)
        .map_err(|_| AppError::verification(Reason::ClaimsNotBase64))?;
    let claims_value: Value = serde_json::from_slice(&claims_bytes)
        .map_err(|_| AppError::verification(Reason::ClaimsNotJson))?;
    let claims = validation::validate_claim_set(&claims_value).map_err(AppError::verification)?;

    let claims_orig = claims
        .orig
        .tn
        .value()
        .ok_or(AppError::verification(Reason::OrigTnMismatch))?;
    if claims_orig != request.orig_tn {
        return Err(AppError::verification(Reason::OrigTnMismatch));
    }
    if !same_multiset(&request.dest_tns, &claims.dest.tn) {
        return Err(AppError::verification(Reason::DestTnMismatch));
    }
    if claims.iat > now {
        return Err(AppError::verification(Reason::IatInFuture));
    }
    if now - claims.iat > ctx.config.valid_iat_period {
        return Err(AppError::verification(Reason::IatStale));
    }

    let canon = canonical::claims_string(&claims)
        .map_err(|_| AppError::verification(Reason::ClaimsNotJson))?;
    if ctx.replay.present(claims.iat, &canon).await {
        return Err(AppError::verification(Reason::ReplayDetected));
    }

    let key = match ctx.public_keys.fetch(&header.x5u).await {
        Some(key) => key,
        None => {
            let key = fetch_and_verify_cert(ctx, &header.x5u, now).await?;
            ctx.public_keys.add(header.x5u.clone(), key).await;
            key
        }
    };

    let signing_input = segments.signing_input();
    let signature = b64::decode(segments.signature_b64)
        .map_err(|_| AppError::verification(Reason::SignatureInvalid))?;
    es256::verify(&signing_input, &signature, &key)
        .map_err(|_| AppError::verification(Reason::SignatureInvalid))?;

    ctx.replay.add(claims.iat, canon).await;

    Ok(json!({
        "verificationResponse": {
            "dest": { "tn": request.dest_tns },
            "iat": request.iat,
            "orig": { "tn": [request.orig_tn] },
            "jwt": { "header": header, "claims": claims },
        }
    }))
}

/// Cache miss path: GET the x5u, check the certificate, and extract its
/// verifying key. Fetch failures surface per request and never poison the
/// cache.
async fn fetch_and_verify_cert(
    ctx: &CoreContext,
    x5u: &str,
    now: i64,
) -> Result<VerifyingKey, AppError> {
    let response = ctx
        .http_client
        .get(x5u)
        .send()
        .await
        .map_err(|_| AppError::verification(Reason::CertFetchFailed))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|_| AppError::verification(Reason::CertReadFailed))?;
    if !status.is_success() {
        return Err(AppError::verification(Reason::CertFetchFailed));
    }

    if !ctx.config.verify_root_ca {
        tracing::warn!(x5u, "root CA verification is disabled; skipping chain validation");
    }
    let roots = ctx.root_certs.roots().await;
    chain::verify_cert_and_extract_key(
        &body,
        &roots,
        u64::try_from(now).unwrap_or_default(),
        ctx.config.verify_root_ca,
    )
    .map_err(|e| AppError::verification(chain_reason(&e)))
}

fn identity_reason(err: IdentityError) -> Reason {
    match err {
        IdentityError::MissingInfo => Reason::IdentityMissingInfo,
        IdentityError::MalformedInfo => Reason::IdentityMalformedInfo,
        IdentityError::BadAlgParam => Reason::IdentityBadAlgParam,
        IdentityError::BadPptParam => Reason::IdentityBadPptParam,
        IdentityError::JwtSegments => Reason::JwtNotThreeSegments,
    }
}

fn chain_reason(err: &ChainError) -> Reason {
    match err {
        ChainError::NoPemData => Reason::CertNoPemData,
        ChainError::CertParse(_) => Reason::CertParseFailed,
        ChainError::Expired => Reason::CertExpired,
        ChainError::UnknownAuthority => Reason::CertUnknownAuthority,
        ChainError::NotAuthorizedToSign => Reason::CertNotAuthorizedToSign,
        ChainError::IssuerMismatch => Reason::CertIssuerMismatch,
        ChainError::Chain(_) | ChainError::BadRoot(_) => Reason::CertChainFailed,
        ChainError::NotEcP256 => Reason::CertNotEcP256,
    }
}

fn same_multiset(request_tns: &[String], claim_tns: &[String]) -> bool {
    if request_tns.len() != claim_tns.len() {
        return false;
    }
    let mut a = request_tns.to_vec();
    let mut b = claim_tns.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}
