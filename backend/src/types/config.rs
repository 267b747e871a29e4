//! Typed configuration bundle, read once at startup from a JSON file.

use std::path::Path;

use serde::Deserialize;

/// Service configuration. Every field has a default, so a partial file is
/// acceptable; unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_file: String,
    pub log_file_max_size: i64,
    pub log_host: String,
    pub http_host: String,
    pub http_port: u16,
    pub ssl_cert_file: String,
    pub ssl_key_file: String,
    pub kma_credentials_file: String,
    pub kma_credentials_refresh_interval: u64,
    pub certrepo_host_file: String,
    pub certrepo_file_check_interval: u64,
    pub root_certs_fetch_interval: u64,
    pub signing_credentials_fetch_interval: u64,
    pub replay_cache_sweep_interval: u64,
    pub public_keys_cache_flush_interval: u64,
    pub verify_root_ca: bool,
    /// How far in the past a claim's iat may be, in seconds.
    pub valid_iat_period: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: "/var/log/vesper/vesper.log".to_owned(),
            log_file_max_size: 50_000_000,
            log_host: String::new(),
            http_host: String::new(),
            http_port: 8000,
            ssl_cert_file: String::new(),
            ssl_key_file: String::new(),
            kma_credentials_file: String::new(),
            kma_credentials_refresh_interval: 60,
            certrepo_host_file: String::new(),
            certrepo_file_check_interval: 60,
            root_certs_fetch_interval: 300,
            signing_credentials_fetch_interval: 300,
            replay_cache_sweep_interval: 70,
            public_keys_cache_flush_interval: 300,
            verify_root_ca: true,
            valid_iat_period: 60,
        }
    }
}

impl Config {
    /// Loads the configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_intervals() {
        let config = Config::default();
        assert_eq!(config.http_port, 8000);
        assert_eq!(config.kma_credentials_refresh_interval, 60);
        assert_eq!(config.certrepo_file_check_interval, 60);
        assert_eq!(config.root_certs_fetch_interval, 300);
        assert_eq!(config.signing_credentials_fetch_interval, 300);
        assert_eq!(config.replay_cache_sweep_interval, 70);
        assert_eq!(config.public_keys_cache_flush_interval, 300);
        assert!(config.verify_root_ca);
        assert_eq!(config.valid_iat_period, 60);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let config: Config = serde_json::from_str(
            r#"{"http_port": 9000, "verify_root_ca": false, "valid_iat_period": 120}"#,
        )
        .unwrap();
        assert_eq!(config.http_port, 9000);
        assert!(!config.verify_root_ca);
        assert_eq!(config.valid_iat_period, 120);
        assert_eq!(config.replay_cache_sweep_interval, 70);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let config: Config =
            serde_json::from_str(r#"{"http_port": 8080, "not_a_field": true}"#).unwrap();
        assert_eq!(config.http_port, 8080);
    }
}
