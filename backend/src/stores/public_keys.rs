//! Cache of verifying keys parsed from fetched x5u certificates.
//!
//! Entries never expire individually; the scheduler flushes the whole
//! cache on an interval so replaced certificates cannot linger.

use std::collections::HashMap;

use passport::VerifyingKey;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct PublicKeyCache {
    inner: RwLock<HashMap<String, VerifyingKey>>,
}

impl PublicKeyCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fetch(&self, x5u: &str) -> Option<VerifyingKey> {
        self.inner.read().await.get(x5u).cloned()
    }

    pub async fn add(&self, x5u: String, key: VerifyingKey) {
        self.inner.write().await.insert(x5u, key);
    }

    pub async fn flush(&self) {
        self.inner.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
