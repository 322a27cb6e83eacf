//! Startup helpers shared by the service binaries.

use std::sync::Arc;

use booking_store::{BookingStore, InMemoryBookingStore, PostgresBookingStore, StoreError};
use event_bus::{ConsumerError, EventBus, EventBusError, InMemoryEventBus};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use thiserror::Error;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;

/// Errors that stop a binary before or while it serves.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Event bus error: {0}")]
    Bus(#[from] EventBusError),

    #[error("KAFKA_BROKERS is set but this binary was built without the `kafka` feature")]
    KafkaDisabled,

    #[error("Failed to install metrics recorder: {0}")]
    Metrics(String),

    #[error("Consumer stopped: {0}")]
    Consumer(#[from] ConsumerError),

    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Store shared by the HTTP handlers and the consumers.
pub type SharedStore = Arc<dyn BookingStore>;

/// Bus shared by the HTTP handlers and the consumers.
pub type SharedBus = Arc<dyn EventBus>;

/// Installs the global tracing subscriber.
pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Installs the Prometheus recorder and returns its render handle.
pub fn install_metrics() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| BootstrapError::Metrics(e.to_string()))
}

/// Connects to PostgreSQL and applies migrations, or falls back to memory.
pub async fn open_store(config: &Config) -> Result<SharedStore> {
    let Some(url) = &config.database_url else {
        warn!("DATABASE_URL not set, using in-memory booking store");
        return Ok(Arc::new(InMemoryBookingStore::new()));
    };

    let store = PostgresBookingStore::connect(url).await?;
    store.run_migrations().await?;
    info!("Database migrations applied");
    Ok(Arc::new(store))
}

/// Connects to Kafka, or falls back to an in-process bus.
pub fn open_bus(config: &Config) -> Result<SharedBus> {
    match &config.kafka_brokers {
        Some(brokers) => kafka_bus(brokers),
        None => {
            warn!("KAFKA_BROKERS not set, using in-memory event bus");
            Ok(Arc::new(InMemoryEventBus::new()))
        }
    }
}

#[cfg(feature = "kafka")]
fn kafka_bus(brokers: &str) -> Result<SharedBus> {
    let bus = event_bus::KafkaEventBus::new(brokers)?;
    info!(brokers, "Connected to Kafka");
    Ok(Arc::new(bus))
}

#[cfg(not(feature = "kafka"))]
fn kafka_bus(_brokers: &str) -> Result<SharedBus> {
    Err(BootstrapError::KafkaDisabled)
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            info!("received SIGTERM, starting graceful shutdown");
        }
    }
}
