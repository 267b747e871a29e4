//! Upstream authentication: bearer tokens from the key-management
//! authority, exchanged for the key/secret held in a credentials file.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{anyhow, Context};
use chrono::Utc;
use serde::Deserialize;
use tokio::sync::RwLock;

/// On-disk credentials: `{aum:{url,key,secret}, eks:<kma-base-url>}`.
#[derive(Debug, Clone, Deserialize)]
struct CredentialsFile {
    aum: AumCredentials,
    eks: String,
}

#[derive(Debug, Clone, Deserialize)]
struct AumCredentials {
    url: String,
    key: String,
    secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    expires_in: i64,
    token: String,
}

#[derive(Debug, Clone)]
struct KmaState {
    aum_url: String,
    aum_key: String,
    aum_secret: String,
    kma_url: String,
    bearer: String,
    bearer_expires_at: i64,
}

/// Holds the current bearer token for the KMA, refreshed on a schedule.
pub struct KmaTokenStore {
    file: PathBuf,
    client: reqwest::Client,
    state: RwLock<KmaState>,
    file_mtime: RwLock<Option<SystemTime>>,
}

impl KmaTokenStore {
    /// Reads the credentials file and performs the initial token exchange.
    pub async fn init(
        file: impl Into<PathBuf>,
        client: reqwest::Client,
    ) -> anyhow::Result<Self> {
        let file = file.into();
        let creds = read_credentials(&file)?;
        let mtime = file_mtime(&file)?;
        let (expires_in, token) =
            exchange(&client, &creds.aum.url, &creds.aum.key, &creds.aum.secret).await?;
        Ok(Self {
            file,
            client,
            state: RwLock::new(KmaState {
                aum_url: creds.aum.url,
                aum_key: creds.aum.key,
                aum_secret: creds.aum.secret,
                kma_url: creds.eks,
                bearer: token,
                bearer_expires_at: Utc::now().timestamp() + expires_in,
            }),
            file_mtime: RwLock::new(Some(mtime)),
        })
    }

    /// The KMA base URL and the current bearer token.
    pub async fn get(&self) -> (String, String) {
        let state = self.state.read().await;
        (state.kma_url.clone(), state.bearer.clone())
    }

    /// Refresh rule: an unchanged credentials-file mtime means re-exchange
    /// with the held key/secret; a changed mtime means re-read the file and
    /// exchange with whatever it now says. Failures leave prior state.
    pub async fn refresh(&self) -> anyhow::Result<()> {
        let mtime = file_mtime(&self.file)?;
        if *self.file_mtime.read().await == Some(mtime) {
            return self.refresh_bearer().await;
        }

        let creds = read_credentials(&self.file)?;
        let (expires_in, token) = exchange(
            &self.client,
            &creds.aum.url,
            &creds.aum.key,
            &creds.aum.secret,
        )
        .await?;

        let mut state = self.state.write().await;
        *state = KmaState {
            aum_url: creds.aum.url,
            aum_key: creds.aum.key,
            aum_secret: creds.aum.secret,
            kma_url: creds.eks,
            bearer: token,
            bearer_expires_at: Utc::now().timestamp() + expires_in,
        };
        drop(state);
        *self.file_mtime.write().await = Some(mtime);
        Ok(())
    }

    async fn refresh_bearer(&self) -> anyhow::Result<()> {
        let (aum_url, key, secret) = {
            let state = self.state.read().await;
            (
                state.aum_url.clone(),
                state.aum_key.clone(),
                state.aum_secret.clone(),
            )
        };
        let (expires_in, token) = exchange(&self.client, &aum_url, &key, &secret).await?;

        let mut state = self.state.write().await;
        state.bearer = token;
        state.bearer_expires_at = Utc::now().timestamp() + expires_in;
        tracing::debug!(expires_at = state.bearer_expires_at, "refreshed KMA bearer token");
        Ok(())
    }
}

/// Exchanges the key/secret for a bearer JWT at the AUM endpoint.
async fn exchange(
    client: &reqwest::Client,
    aum_url: &str,
    key: &str,
    secret: &str,
) -> anyhow::Result<(i64, String)> {
    let response = client
        .post(aum_url)
        .basic_auth(key, Some(secret))
        .json(&serde_json::json!({ "type": "Server" }))
        .send()
        .await
        .with_context(|| format!("POST {aum_url} failed"))?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!("token exchange at {aum_url} returned {status}: {body}"));
    }
    let body: TokenResponse = response
        .json()
        .await
        .with_context(|| format!("parse token response from {aum_url}"))?;
    Ok((body.expires_in, body.token))
}

fn read_credentials(path: &Path) -> anyhow::Result<CredentialsFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("KMA credentials file {}", path.display()))?;
    let creds: CredentialsFile =
        serde_json::from_str(&raw).context("decode JSON object in KMA credentials file")?;
    for (name, value) in [
        ("aum.url", &creds.aum.url),
        ("aum.key", &creds.aum.key),
        ("aum.secret", &creds.aum.secret),
        ("eks", &creds.eks),
    ] {
        if value.trim().is_empty() {
            return Err(anyhow!("\"{name}\" in KMA credentials file is an empty string"));
        }
    }
    Ok(creds)
}

fn file_mtime(path: &Path) -> anyhow::Result<SystemTime> {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .with_context(|| format!("stat KMA credentials file {}", path.display()))
}
