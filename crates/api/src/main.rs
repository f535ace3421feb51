//! API server entry point.

use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;
use registration::CounterReconciler;
use store::{InMemoryStore, MarathonStore, PostgresStore, RegistrationStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use api::config::{Config, DEV_JWT_SECRET};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn serve<S>(store: S, config: Config, metrics_handle: PrometheusHandle)
where
    S: MarathonStore + RegistrationStore + Clone + 'static,
{
    if config.reconcile_interval_secs > 0 {
        let reconciler = CounterReconciler::new(store.clone());
        let period = Duration::from_secs(config.reconcile_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                if let Err(error) = reconciler.run().await {
                    tracing::error!(%error, "counter reconciliation pass failed");
                }
            }
        });
    }

    let addr = config.addr();
    let state = api::create_state(store, config);
    let app = api::create_app(state, metrics_handle);

    tracing::info!(%addr, "starting marathon API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Load configuration and pick a store backend
    let config = Config::from_env();
    if config.production && config.jwt_secret == DEV_JWT_SECRET {
        tracing::warn!("JWT_SECRET is unset in production, using the insecure default");
    }

    match config.database_url.clone() {
        Some(url) => {
            let store = PostgresStore::connect(&url)
                .await
                .expect("failed to connect to database");
            store.run_migrations().await.expect("migrations failed");
            serve(store, config, metrics_handle).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            serve(InMemoryStore::new(), config, metrics_handle).await;
        }
    }
}
