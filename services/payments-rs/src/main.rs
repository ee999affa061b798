// services/payments-rs/src/main.rs

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use payments_rs::config::Config;
use payments_rs::handlers::{self, AppState};
use payments_rs::metrics::Metrics;
use payments_rs::{IdempoCache, PaymentRecorder, PaymentStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::from_env()?;

    let store = PaymentStore::connect(&cfg.database_url, cfg.db_max_connections)
        .await
        .with_context(|| format!("opening payment store at {}", cfg.database_url))?;
    let cache = IdempoCache::with_policy(cfg.cache);
    let recorder = PaymentRecorder::new(store, cache);
    let metrics = Metrics::new().context("registering metrics")?;

    let app = handlers::router(AppState::new(recorder, metrics));

    let listener = tokio::net::TcpListener::bind(cfg.addr)
        .await
        .with_context(|| format!("binding {}", cfg.addr))?;
    info!("payments-rs http on {}", cfg.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("payments-rs stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
