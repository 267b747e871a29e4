//! Replay-attack detector: a multimap from issued-at time to the set of
//! canonical claim strings already verified at that second.

use std::collections::{BTreeMap, HashSet};

use tokio::sync::RwLock;

#[derive(Default)]
pub struct ReplayCache {
    inner: RwLock<BTreeMap<i64, HashSet<String>>>,
}

impl ReplayCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent insert of a canonical claim string at its iat.
    pub async fn add(&self, iat: i64, canon: String) {
        self.inner.write().await.entry(iat).or_default().insert(canon);
    }

    /// True iff this exact claim set was already seen at this iat.
    pub async fn present(&self, iat: i64, canon: &str) -> bool {
        self.inner
            .read()
            .await
            .get(&iat)
            .is_some_and(|set| set.contains(canon))
    }

    /// Removes every entry whose key is `<= floor`.
    pub async fn sweep(&self, floor: i64) {
        let mut inner = self.inner.write().await;
        let kept = inner.split_off(&floor.saturating_add(1));
        *inner = kept;
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.values().map(HashSet::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
