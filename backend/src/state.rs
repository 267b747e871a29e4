//! Shared application state handed to handlers and background tasks.

use std::sync::Arc;
use std::time::Duration;

use crate::kma::KmaTokenStore;
use crate::stats::ApiStats;
use crate::stores::{
    CertRepoLocator, PublicKeyCache, ReplayCache, RootCertStore, SigningCredsStore,
};
use crate::types::Config;

/// Outbound calls to the KMA and the certificate repository are bounded.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(2);

/// Everything a request handler or refresh ticker needs, constructed once
/// at startup. No hidden globals.
pub struct CoreContext {
    pub config: Config,
    pub http_client: reqwest::Client,
    pub kma: Arc<KmaTokenStore>,
    pub cert_repo: Arc<CertRepoLocator>,
    pub root_certs: Arc<RootCertStore>,
    pub signing_creds: Arc<SigningCredsStore>,
    pub public_keys: Arc<PublicKeyCache>,
    pub replay: Arc<ReplayCache>,
    pub stats: Arc<ApiStats>,
}

impl CoreContext {
    /// The shared outbound HTTP client with the bounded timeout.
    pub fn http_client() -> anyhow::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(Into::into)
    }
}
