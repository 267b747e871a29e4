mod common;

use common::{error_code, sign_payload, TestSetup};
use serde_json::json;

fn is_b64url(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[tokio::test]
async fn minimal_sign_returns_a_wellformed_identity() {
    let setup = TestSetup::new().await;

    let response = setup
        .post_json("/stir/v1/signing", &sign_payload(1_517_847_072))
        .await;
    assert_eq!(response.status(), 200);

    let body = TestSetup::body_json(response).await;
    let identity = body["signingResponse"]["identity"].as_str().unwrap();

    // `<b64>.<b64>.<b64>;info=<x5u>;alg=ES256;ppt=shaken`
    let (jwt, params) = identity.split_once(';').unwrap();
    let segments: Vec<&str> = jwt.split('.').collect();
    assert_eq!(segments.len(), 3);
    assert!(segments.iter().all(|s| is_b64url(s)), "jwt: {jwt}");
    assert_eq!(params, format!("info=<{}>;alg=ES256;ppt=shaken", setup.x5u));
}

#[tokio::test]
async fn jwt_header_and_claims_decode_to_the_expected_json() {
    let setup = TestSetup::new().await;
    let identity = setup.sign_identity(&sign_payload(1_517_847_072)).await;

    let jwt = identity.split(';').next().unwrap();
    let segments: Vec<&str> = jwt.split('.').collect();

    let header: serde_json::Value =
        serde_json::from_slice(&passport::b64::decode(segments[0]).unwrap()).unwrap();
    assert_eq!(
        header,
        json!({"alg": "ES256", "ppt": "shaken", "typ": "passport", "x5u": setup.x5u})
    );

    let claims = String::from_utf8(passport::b64::decode(segments[1]).unwrap()).unwrap();
    assert_eq!(
        claims,
        r#"{"attest":"A","dest":{"tn":["+12155551213"]},"iat":1517847072,"orig":{"tn":"+12155551212"},"origid":"de305d54-75b4-431b-adb2-eb6b9e546014"}"#
    );

    let signature = passport::b64::decode(segments[2]).unwrap();
    assert_eq!(signature.len(), 64);
}

#[tokio::test]
async fn empty_body_is_rejected() {
    let setup = TestSetup::new().await;
    let response = setup.post_raw("/stir/v1/signing", "").await;
    assert_eq!(response.status(), 400);
    let body = TestSetup::body_json(response).await;
    assert_eq!(error_code(&body, "signingResponse"), "VESPER-4001");
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let setup = TestSetup::new().await;
    let response = setup.post_raw("/stir/v1/signing", "{not json").await;
    assert_eq!(response.status(), 400);
    let body = TestSetup::body_json(response).await;
    assert_eq!(error_code(&body, "signingResponse"), "VESPER-4002");
}

#[tokio::test]
async fn missing_attest_is_rejected() {
    let setup = TestSetup::new().await;
    let mut payload = sign_payload(1_517_847_072);
    payload.as_object_mut().unwrap().remove("attest");

    let response = setup.post_json("/stir/v1/signing", &payload).await;
    assert_eq!(response.status(), 400);
    let body = TestSetup::body_json(response).await;
    assert_eq!(error_code(&body, "signingResponse"), "VESPER-4003");
}

#[tokio::test]
async fn bad_attestation_level_is_rejected() {
    let setup = TestSetup::new().await;
    let mut payload = sign_payload(1_517_847_072);
    payload["attest"] = json!("D");

    let response = setup.post_json("/stir/v1/signing", &payload).await;
    assert_eq!(response.status(), 400);
    let body = TestSetup::body_json(response).await;
    assert_eq!(error_code(&body, "signingResponse"), "VESPER-4006");
}

#[tokio::test]
async fn extra_field_is_rejected() {
    let setup = TestSetup::new().await;
    let mut payload = sign_payload(1_517_847_072);
    payload.as_object_mut().unwrap().insert("extra".into(), json!(true));

    let response = setup.post_json("/stir/v1/signing", &payload).await;
    assert_eq!(response.status(), 400);
    let body = TestSetup::body_json(response).await;
    assert_eq!(error_code(&body, "signingResponse"), "VESPER-4004");
}

#[tokio::test]
async fn trace_id_is_echoed() {
    let setup = TestSetup::new().await;
    let request = axum::http::Request::builder()
        .uri("/stir/v1/signing")
        .method("POST")
        .header("Content-Type", "application/json")
        .header("Trace-Id", "VESPER-fixed-trace")
        .body(axum::body::Body::from(sign_payload(1).to_string()))
        .unwrap();
    let response = tower::ServiceExt::oneshot(setup.router.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.headers()["Trace-Id"], "VESPER-fixed-trace");
}

#[tokio::test]
async fn trace_id_is_generated_when_absent() {
    let setup = TestSetup::new().await;
    let response = setup.post_json("/stir/v1/signing", &sign_payload(1)).await;
    let trace_id = response.headers()["Trace-Id"].to_str().unwrap();
    assert!(trace_id.starts_with("VESPER-"), "trace id: {trace_id}");
}
