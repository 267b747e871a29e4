//! Periodic refresh of credentials, trust material, and caches.
//!
//! The scheduler owns all timers: six independent tickers joined under a
//! single cancellation token. Missed ticks are dropped, each tick runs its
//! work to completion, and cancellation stops every ticker within one tick.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::state::CoreContext;

pub struct Scheduler {
    ctx: Arc<CoreContext>,
    shutdown: CancellationToken,
}

impl Scheduler {
    #[must_use]
    pub fn new(ctx: Arc<CoreContext>) -> Self {
        Self {
            ctx,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops all tickers when cancelled.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Spawns the six refresh tickers.
    pub fn spawn(&self) -> Vec<JoinHandle<()>> {
        let config = &self.ctx.config;
        vec![
            self.spawn_ticker("kma-token-refresh", config.kma_credentials_refresh_interval, {
                let ctx = self.ctx.clone();
                move || {
                    let ctx = ctx.clone();
                    async move {
                        if let Err(e) = ctx.kma.refresh().await {
                            tracing::warn!("KMA token refresh failed: {e:#}");
                        }
                    }
                }
            }),
            self.spawn_ticker("certrepo-file-check", config.certrepo_file_check_interval, {
                let ctx = self.ctx.clone();
                move || {
                    let ctx = ctx.clone();
                    async move {
                        if let Err(e) = ctx.cert_repo.refresh().await {
                            tracing::warn!("certificate repository check failed: {e:#}");
                        }
                    }
                }
            }),
            self.spawn_ticker("root-certs-fetch", config.root_certs_fetch_interval, {
                let ctx = self.ctx.clone();
                move || {
                    let ctx = ctx.clone();
                    async move {
                        if let Err(e) = ctx.root_certs.refresh().await {
                            tracing::warn!("root certificate refresh failed: {e:#}");
                        }
                    }
                }
            }),
            self.spawn_ticker(
                "signing-creds-fetch",
                config.signing_credentials_fetch_interval,
                {
                    let ctx = self.ctx.clone();
                    move || {
                        let ctx = ctx.clone();
                        async move {
                            if let Err(e) = ctx.signing_creds.refresh().await {
                                tracing::warn!("signing credentials refresh failed: {e:#}");
                            }
                        }
                    }
                },
            ),
            self.spawn_ticker("replay-cache-sweep", config.replay_cache_sweep_interval, {
                let ctx = self.ctx.clone();
                move || {
                    let ctx = ctx.clone();
                    async move {
                        // Wall-clock aging: everything older than the valid
                        // iat window is gone within one sweep period.
                        let floor = Utc::now().timestamp() - ctx.config.valid_iat_period;
                        ctx.replay.sweep(floor).await;
                    }
                }
            }),
            self.spawn_ticker(
                "public-keys-flush",
                config.public_keys_cache_flush_interval,
                {
                    let ctx = self.ctx.clone();
                    move || {
                        let ctx = ctx.clone();
                        async move {
                            ctx.public_keys.flush().await;
                        }
                    }
                },
            ),
        ]
    }

    fn spawn_ticker<F, Fut>(&self, name: &'static str, period_secs: u64, work: F) -> JoinHandle<()>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = self.shutdown.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(period_secs.max(1)));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; init already ran.
            interval.tick().await;
            loop {
                tokio::select! {
                    () = token.cancelled() => {
                        tracing::info!("stopping {name} ticker");
                        break;
                    }
                    _ = interval.tick() => work().await,
                }
            }
        })
    }
}
