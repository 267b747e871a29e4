//! Locator for the certificate repository hosting public signing
//! certificates: a watched JSON file carrying the HTTPS base URL.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{anyhow, Context};
use serde::Deserialize;
use tokio::sync::RwLock;

#[derive(Debug, Deserialize)]
struct CertRepoFile {
    #[serde(rename = "sticrHost")]
    sticr_host: String,
}

struct CertRepoState {
    base_url: String,
    mtime: SystemTime,
}

pub struct CertRepoLocator {
    file: PathBuf,
    state: RwLock<CertRepoState>,
}

impl CertRepoLocator {
    pub fn init(file: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let file = file.into();
        let (base_url, mtime) = read_host_file(&file)?;
        Ok(Self {
            file,
            state: RwLock::new(CertRepoState { base_url, mtime }),
        })
    }

    /// Current certificate-repository base URL.
    pub async fn base_url(&self) -> String {
        self.state.read().await.base_url.clone()
    }

    /// Re-reads the file only when its mtime has moved.
    pub async fn refresh(&self) -> anyhow::Result<()> {
        let mtime = std::fs::metadata(&self.file)
            .and_then(|meta| meta.modified())
            .with_context(|| format!("stat sticr host file {}", self.file.display()))?;
        if self.state.read().await.mtime == mtime {
            return Ok(());
        }
        let (base_url, mtime) = read_host_file(&self.file)?;
        let mut state = self.state.write().await;
        *state = CertRepoState { base_url, mtime };
        Ok(())
    }
}

fn read_host_file(path: &Path) -> anyhow::Result<(String, SystemTime)> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("sticr host file {}", path.display()))?;
    let mtime = std::fs::metadata(path).and_then(|meta| meta.modified())?;
    let parsed: CertRepoFile =
        serde_json::from_str(&raw).context("decode JSON object in sticr host file")?;
    if parsed.sticr_host.trim().is_empty() {
        return Err(anyhow!("\"sticrHost\" value is an empty string"));
    }
    Ok((parsed.sticr_host, mtime))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vesper-sticr-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn init_reads_the_host() {
        let path = temp_file("host.json", r#"{"sticrHost":"https://cr.example.test"}"#);
        let locator = CertRepoLocator::init(path).unwrap();
        assert_eq!(locator.base_url().await, "https://cr.example.test");
    }

    #[test]
    fn empty_host_is_rejected() {
        let path = temp_file("empty.json", r#"{"sticrHost":"  "}"#);
        assert!(CertRepoLocator::init(path).is_err());
    }

    #[test]
    fn missing_field_is_rejected() {
        let path = temp_file("missing.json", r#"{"host":"https://x"}"#);
        assert!(CertRepoLocator::init(path).is_err());
    }

    #[tokio::test]
    async fn refresh_with_unchanged_mtime_keeps_state() {
        let path = temp_file("stable.json", r#"{"sticrHost":"https://one"}"#);
        let locator = CertRepoLocator::init(&path).unwrap();

        // Rewriting the content without the mtime moving is not observable
        // through the metadata API, so just assert the debounced path.
        locator.refresh().await.unwrap();
        assert_eq!(locator.base_url().await, "https://one");
    }

    #[tokio::test]
    async fn refresh_picks_up_a_rewritten_file() {
        let path = temp_file("rotating.json", r#"{"sticrHost":"https://one"}"#);
        let locator = CertRepoLocator::init(&path).unwrap();

        std::fs::write(&path, r#"{"sticrHost":"https://two"}"#).unwrap();
        // Nudge the mtime forward explicitly; coarse filesystem clocks can
        // otherwise leave it unchanged within the same test run.
        let later = SystemTime::now() + std::time::Duration::from_secs(2);
        let file = std::fs::File::open(&path).unwrap();
        file.set_modified(later).unwrap();

        locator.refresh().await.unwrap();
        assert_eq!(locator.base_url().await, "https://two");
    }
}
