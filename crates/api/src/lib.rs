//! HTTP adapter and process wiring for the booking saga.
//!
//! Exposes booking intake over REST, with structured logging (tracing) and
//! Prometheus metrics. The [`bootstrap`] module holds the startup pieces both
//! binaries share.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use booking_store::BookingStore;
use event_bus::EventBus;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::bookings::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, B>(state: Arc<AppState<S, B>>, metrics_handle: PrometheusHandle) -> Router
where
    S: BookingStore + 'static,
    B: EventBus + 'static,
{
    Router::new()
        .route(
            "/bookings",
            get(routes::bookings::list::<S, B>).post(routes::bookings::create::<S, B>),
        )
        .with_state(state)
        .merge(create_ops_app(metrics_handle))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Health and metrics routes only, for processes without booking routes.
pub fn create_ops_app(metrics_handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/health", get(routes::health::check))
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle)
}
