//! Test setup: a real router wired to mock KMA and certificate-repository
//! origins, with rcgen-minted CA and signing material.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
use serde_json::{json, Value};
use tower::ServiceExt;

use vesper::kma::KmaTokenStore;
use vesper::server;
use vesper::state::CoreContext;
use vesper::stats::ApiStats;
use vesper::stores::{
    CertRepoLocator, PublicKeyCache, ReplayCache, RootCertStore, SigningCredsStore,
};
use vesper::types::Config;

/// Knobs the individual tests turn.
pub struct TestOptions {
    pub verify_root_ca: bool,
    pub valid_iat_period: i64,
    /// Serve a whitelist that does NOT contain the CA that signed the
    /// service's certificate.
    pub untrusted_signer: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            verify_root_ca: true,
            valid_iat_period: 60,
            untrusted_signer: false,
        }
    }
}

#[allow(dead_code)]
pub struct TestSetup {
    pub router: Router,
    pub ctx: Arc<CoreContext>,
    pub x5u: String,
    temp_dir: PathBuf,
}

impl TestSetup {
    pub async fn new() -> Self {
        Self::with_options(TestOptions::default()).await
    }

    pub async fn with_options(options: TestOptions) -> Self {
        let ca_key = KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256).unwrap();
        let mut ca_params = CertificateParams::new(Vec::new()).unwrap();
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params
            .distinguished_name
            .push(DnType::CommonName, "Vesper Test Root");
        let ca_cert = ca_params.self_signed(&ca_key).unwrap();

        let leaf_key = KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256).unwrap();
        let leaf_params = CertificateParams::new(vec!["sp.example.test".to_owned()]).unwrap();
        let leaf_cert = leaf_params.signed_by(&leaf_key, &ca_cert, &ca_key).unwrap();

        let whitelist_pem = if options.untrusted_signer {
            let other_key = KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256).unwrap();
            let mut other_params = CertificateParams::new(Vec::new()).unwrap();
            other_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
            other_params
                .distinguished_name
                .push(DnType::CommonName, "Unrelated Root");
            other_params.self_signed(&other_key).unwrap().pem()
        } else {
            ca_cert.pem()
        };

        let kma_addr = spawn_mock_kma(whitelist_pem, leaf_key.serialize_pem()).await;
        let cr_addr = spawn_mock_cert_repo(leaf_cert.pem()).await;

        let temp_dir =
            std::env::temp_dir().join(format!("vesper-e2e-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&temp_dir).unwrap();
        let credentials_file = temp_dir.join("kma-credentials.json");
        std::fs::write(
            &credentials_file,
            json!({
                "aum": {
                    "url": format!("http://{kma_addr}/token"),
                    "key": "test-key",
                    "secret": "test-secret",
                },
                "eks": format!("http://{kma_addr}"),
            })
            .to_string(),
        )
        .unwrap();
        let sticr_file = temp_dir.join("sticr.json");
        std::fs::write(
            &sticr_file,
            json!({ "sticrHost": format!("http://{cr_addr}") }).to_string(),
        )
        .unwrap();

        let config = Config {
            kma_credentials_file: credentials_file.to_string_lossy().into_owned(),
            certrepo_host_file: sticr_file.to_string_lossy().into_owned(),
            verify_root_ca: options.verify_root_ca,
            valid_iat_period: options.valid_iat_period,
            ..Config::default()
        };

        let http_client = CoreContext::http_client().unwrap();
        let kma = Arc::new(
            KmaTokenStore::init(&config.kma_credentials_file, http_client.clone())
                .await
                .unwrap(),
        );
        let cert_repo = Arc::new(CertRepoLocator::init(&config.certrepo_host_file).unwrap());
        let signing_creds = Arc::new(
            SigningCredsStore::init(kma.clone(), cert_repo.clone(), http_client.clone())
                .await
                .unwrap(),
        );
        let root_certs = Arc::new(
            RootCertStore::init(kma.clone(), http_client.clone())
                .await
                .unwrap(),
        );

        let x5u = format!("http://{cr_addr}/sp.pem");
        let ctx = Arc::new(CoreContext {
            config,
            http_client,
            kma,
            cert_repo,
            root_certs,
            signing_creds,
            public_keys: Arc::new(PublicKeyCache::new()),
            replay: Arc::new(ReplayCache::new()),
            stats: Arc::new(ApiStats::new()),
        });
        let router = server::router(ctx.clone());

        Self {
            router,
            ctx,
            x5u,
            temp_dir,
        }
    }

    pub async fn post_json(&self, route: &str, payload: &Value) -> Response<Body> {
        self.post_raw(route, payload.to_string()).await
    }

    pub async fn post_raw(&self, route: &str, body: impl Into<Body>) -> Response<Body> {
        let request = Request::builder()
            .uri(route)
            .method("POST")
            .header("Content-Type", "application/json")
            .body(body.into())
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, route: &str) -> Response<Body> {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn body_json(response: Response<Body>) -> Value {
        use http_body_util::BodyExt;

        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    /// Signs the payload through the real endpoint and returns the identity.
    pub async fn sign_identity(&self, payload: &Value) -> String {
        let response = self.post_json("/stir/v1/signing", payload).await;
        assert_eq!(response.status(), 200, "signing failed");
        let body = Self::body_json(response).await;
        body["signingResponse"]["identity"]
            .as_str()
            .expect("identity in signing response")
            .to_owned()
    }
}

impl Drop for TestSetup {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.temp_dir);
    }
}

/// A signing payload with the given iat.
pub fn sign_payload(iat: i64) -> Value {
    json!({
        "attest": "A",
        "dest": {"tn": ["+12155551213"]},
        "iat": iat,
        "orig": {"tn": "+12155551212"},
        "origid": "de305d54-75b4-431b-adb2-eb6b9e546014",
    })
}

/// The verification payload matching [`sign_payload`].
pub fn verify_payload(identity: &str, iat: i64) -> Value {
    json!({
        "dest": {"tn": ["+12155551213"]},
        "iat": iat,
        "orig": {"tn": ["+12155551212"]},
        "identity": identity,
    })
}

/// The `code` field of an error envelope.
pub fn error_code<'a>(body: &'a Value, action: &str) -> &'a str {
    body[action]["code"].as_str().expect("error code in body")
}

async fn spawn_mock_kma(rootcerts_pem: String, private_key_pem: String) -> SocketAddr {
    let router = Router::new()
        .route(
            "/token",
            post(|| async { Json(json!({ "expires_in": 3600, "token": "test-bearer" })) }),
        )
        .route(
            "/v1/owner/kms.service.srv/secret/whitelist/data",
            get(move || {
                let rootcerts = rootcerts_pem.clone();
                async move { Json(json!({ "rootcerts": rootcerts })) }
            }),
        )
        .route(
            "/v1/owner/kms.service.srv/secret/signing/data",
            get(move || {
                let private_key = private_key_pem.clone();
                async move {
                    Json(json!({ "filename": "sp.pem", "privateKey": private_key }))
                }
            }),
        );
    spawn_server(router).await
}

async fn spawn_mock_cert_repo(leaf_pem: String) -> SocketAddr {
    let router = Router::new().route("/sp.pem", get(move || {
        let pem = leaf_pem.clone();
        async move { pem }
    }));
    spawn_server(router).await
}

async fn spawn_server(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}
