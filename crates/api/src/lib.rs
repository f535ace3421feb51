//! HTTP API server for marathon listings and registrations.
//!
//! Provides the CRUD surface over the marathon and registration stores,
//! routes registration writes through the coordinator, and guards the
//! registration listing behind a token cookie. Structured logging
//! (tracing) and Prometheus metrics come along for the ride.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use registration::RegistrationCoordinator;
use store::{MarathonStore, RegistrationStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
///
/// The store handle is injected here rather than living in module-level
/// globals, so tests and the binary can each pick their own backend.
pub struct AppState<S> {
    pub store: S,
    pub coordinator: RegistrationCoordinator<S>,
    pub config: Config,
}

/// Creates the application state over a store handle.
pub fn create_state<S>(store: S, config: Config) -> Arc<AppState<S>>
where
    S: MarathonStore + RegistrationStore + Clone,
{
    Arc::new(AppState {
        coordinator: RegistrationCoordinator::new(store.clone()),
        store,
        config,
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router
where
    S: MarathonStore + RegistrationStore + Clone + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/", get(routes::health::liveness))
        .route("/health", get(routes::health::check))
        .route("/marathons", get(routes::marathons::list::<S>))
        .route("/marathons", post(routes::marathons::create::<S>))
        .route("/marathons/{id}", get(routes::marathons::get::<S>))
        .route("/marathons/{id}", put(routes::marathons::update::<S>))
        .route("/marathons/{id}", delete(routes::marathons::remove::<S>))
        .route("/marathonsInHome", get(routes::marathons::home::<S>))
        .route("/registerMarathon", get(routes::registrations::list::<S>))
        .route("/registerMarathon", post(routes::registrations::create::<S>))
        .route(
            "/registerMarathon/{id}",
            put(routes::registrations::update::<S>),
        )
        .route(
            "/registerMarathon/{id}",
            delete(routes::registrations::remove::<S>),
        )
        .route("/jwt", post(routes::session::issue::<S>))
        .route("/logout", post(routes::session::logout))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
