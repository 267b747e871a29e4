//! Trusted root pool, fetched from the KMA's whitelist endpoint.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::kma::KmaTokenStore;

pub const WHITELIST_PATH: &str = "/v1/owner/kms.service.srv/secret/whitelist/data";

#[derive(Debug, Deserialize)]
struct WhitelistResponse {
    rootcerts: String,
}

pub struct RootCertStore {
    kma: Arc<KmaTokenStore>,
    client: reqwest::Client,
    roots: RwLock<Arc<Vec<Vec<u8>>>>,
}

impl RootCertStore {
    pub async fn init(kma: Arc<KmaTokenStore>, client: reqwest::Client) -> anyhow::Result<Self> {
        let roots = fetch_roots(&kma, &client).await?;
        Ok(Self {
            kma,
            client,
            roots: RwLock::new(Arc::new(roots)),
        })
    }

    /// The trusted root pool as DER certificates.
    pub async fn roots(&self) -> Arc<Vec<Vec<u8>>> {
        self.roots.read().await.clone()
    }

    /// Fetch and parse happen before the exclusive section; the swap is a
    /// single assignment. A failed fetch leaves the previous pool intact.
    pub async fn refresh(&self) -> anyhow::Result<()> {
        let fresh = fetch_roots(&self.kma, &self.client).await?;
        *self.roots.write().await = Arc::new(fresh);
        Ok(())
    }
}

async fn fetch_roots(
    kma: &KmaTokenStore,
    client: &reqwest::Client,
) -> anyhow::Result<Vec<Vec<u8>>> {
    let (kma_url, bearer) = kma.get().await;
    let url = format!("{kma_url}{WHITELIST_PATH}");
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
    let body: WhitelistResponse = response
        .json()
        .await
        .with_context(|| format!("parse whitelist response from {url}"))?;
    let roots = passport::chain::roots_from_pem_bundle(&body.rootcerts)
        .context("parse root certificate bundle")?;
    Ok(roots)
}
