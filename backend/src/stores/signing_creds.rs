//! Signing credentials issued by the KMA: the x5u certificate URL and the
//! EC P-256 private key, replaced wholesale on each successful refresh.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use passport::SigningKey;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::kma::KmaTokenStore;

use super::CertRepoLocator;

pub const SIGNING_PATH: &str = "/v1/owner/kms.service.srv/secret/signing/data";

#[derive(Debug, Deserialize)]
struct SigningDataResponse {
    filename: String,
    #[serde(rename = "privateKey")]
    private_key: String,
}

/// The current signing material. Never mutated in place.
pub struct SigningMaterial {
    pub x5u: String,
    pub key: SigningKey,
}

pub struct SigningCredsStore {
    kma: Arc<KmaTokenStore>,
    cert_repo: Arc<CertRepoLocator>,
    client: reqwest::Client,
    material: RwLock<Arc<SigningMaterial>>,
}

impl SigningCredsStore {
    pub async fn init(
        kma: Arc<KmaTokenStore>,
        cert_repo: Arc<CertRepoLocator>,
        client: reqwest::Client,
    ) -> anyhow::Result<Self> {
        let material = fetch_material(&kma, &cert_repo, &client).await?;
        Ok(Self {
            kma,
            cert_repo,
            client,
            material: RwLock::new(Arc::new(material)),
        })
    }

    /// The current `(x5u, private key)` pair.
    pub async fn current(&self) -> Arc<SigningMaterial> {
        self.material.read().await.clone()
    }

    /// Atomic swap on success; prior material survives any failure.
    pub async fn refresh(&self) -> anyhow::Result<()> {
        let fresh = fetch_material(&self.kma, &self.cert_repo, &self.client).await?;
        *self.material.write().await = Arc::new(fresh);
        Ok(())
    }
}

async fn fetch_material(
    kma: &KmaTokenStore,
    cert_repo: &CertRepoLocator,
    client: &reqwest::Client,
) -> anyhow::Result<SigningMaterial> {
    let (kma_url, bearer) = kma.get().await;
    let url = format!("{kma_url}{SIGNING_PATH}");
    let response = client
        .get(&url)
        .bearer_auth(bearer)
        .send()
        .await
        .with_context(|| format!("GET {url} failed"))?;
    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("GET {url} returned {status}"));
    }
    let body: SigningDataResponse = response
        .json()
        .await
        .with_context(|| format!("parse signing response from {url}"))?;
    if body.filename.trim().is_empty() {
        return Err(anyhow!("\"filename\" in signing response is an empty string"));
    }

    let x5u = format!("{}/{}", cert_repo.base_url().await, body.filename);
    let key = passport::es256::signing_key_from_pem(&body.private_key)
        .context("parse signing private key")?;
    Ok(SigningMaterial { x5u, key })
}
