//! Vesper service entry point.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use vesper::kma::KmaTokenStore;
use vesper::scheduler::Scheduler;
use vesper::server;
use vesper::state::CoreContext;
use vesper::stats::ApiStats;
use vesper::stores::{
    CertRepoLocator, PublicKeyCache, ReplayCache, RootCertStore, SigningCredsStore,
};
use vesper::types::Config;

// Distinct exit codes so operators can tell init failures apart.
const EXIT_CONFIG: i32 = 2;
const EXIT_KMA: i32 = 3;
const EXIT_CERT_REPO: i32 = 4;
const EXIT_SIGNING_CREDS: i32 = 5;
const EXIT_ROOT_CERTS: i32 = 6;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let Some(config_path) = std::env::args().nth(1) else {
        tracing::error!("usage: vesper <config-file>");
        std::process::exit(EXIT_CONFIG);
    };
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("unable to load configuration from {config_path}: {e:#}");
            std::process::exit(EXIT_CONFIG);
        }
    };

    tracing::info!("starting vesper");
    let http_client = CoreContext::http_client()?;

    let kma = match KmaTokenStore::init(&config.kma_credentials_file, http_client.clone()).await {
        Ok(kma) => Arc::new(kma),
        Err(e) => {
            tracing::error!("KMA initialization failed: {e:#}");
            std::process::exit(EXIT_KMA);
        }
    };
    let cert_repo = match CertRepoLocator::init(&config.certrepo_host_file) {
        Ok(cert_repo) => Arc::new(cert_repo),
        Err(e) => {
            tracing::error!("certificate repository initialization failed: {e:#}");
            std::process::exit(EXIT_CERT_REPO);
        }
    };
    let signing_creds =
        match SigningCredsStore::init(kma.clone(), cert_repo.clone(), http_client.clone()).await {
            Ok(signing_creds) => Arc::new(signing_creds),
            Err(e) => {
                tracing::error!("signing credentials initialization failed: {e:#}");
                std::process::exit(EXIT_SIGNING_CREDS);
            }
        };
    let root_certs = match RootCertStore::init(kma.clone(), http_client.clone()).await {
        Ok(root_certs) => Arc::new(root_certs),
        Err(e) => {
            tracing::error!("root certificate store initialization failed: {e:#}");
            std::process::exit(EXIT_ROOT_CERTS);
        }
    };

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

    let scheduler = Scheduler::new(ctx.clone());
    let shutdown = scheduler.shutdown_token();
    let tickers = scheduler.spawn();

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            tracing::info!("shutting down vesper");
            shutdown.cancel();
        }
    });

    server::start(ctx, shutdown).await?;

    for ticker in tickers {
        let _ = ticker.await;
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
