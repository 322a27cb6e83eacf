//! Application configuration loaded from environment variables.

use std::time::Duration;

use event_bus::{BackoffPolicy, ConsumerConfig};

/// Runtime configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `json` for JSON log lines, anything else for plain text
/// - `DATABASE_URL`: PostgreSQL URL; unset means an in-memory store
/// - `KAFKA_BROKERS`: broker list; unset means an in-memory bus
/// - `CONSUMER_GROUP`: group for validation results (default: `"booking-group"`)
/// - `HISTORY_CONSUMER_GROUP`: group for outcomes (default: `"history-group"`)
/// - `CONSUMER_MAX_RETRIES`: consecutive connection failures tolerated (default: `10`)
/// - `CONSUMER_BACKOFF_MS`: delay between reconnects (default: `5000`)
/// - `CONSUMER_ERROR_DELAY_MS`: pause after a transient consume error (default: `2000`)
/// - `SAGA_TIMEOUT_SECS`: age at which a pending booking is expired (default: `300`)
/// - `SAGA_SWEEP_INTERVAL_SECS`: how often to look for expired sagas (default: `30`)
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_json: bool,
    pub database_url: Option<String>,
    pub kafka_brokers: Option<String>,
    pub consumer_group: String,
    pub history_consumer_group: String,
    pub consumer_max_retries: usize,
    pub consumer_backoff: Duration,
    pub consumer_error_delay: Duration,
    pub saga_timeout: Duration,
    pub saga_sweep_interval: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// Unparseable numbers fall back to their defaults. Blank URLs count as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_json: lookup("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            database_url: non_blank("DATABASE_URL"),
            kafka_brokers: non_blank("KAFKA_BROKERS"),
            consumer_group: non_blank("CONSUMER_GROUP").unwrap_or(defaults.consumer_group),
            history_consumer_group: non_blank("HISTORY_CONSUMER_GROUP")
                .unwrap_or(defaults.history_consumer_group),
            consumer_max_retries: parsed("CONSUMER_MAX_RETRIES")
                .map_or(defaults.consumer_max_retries, |n| n as usize),
            consumer_backoff: parsed("CONSUMER_BACKOFF_MS")
                .map_or(defaults.consumer_backoff, Duration::from_millis),
            consumer_error_delay: parsed("CONSUMER_ERROR_DELAY_MS")
                .map_or(defaults.consumer_error_delay, Duration::from_millis),
            saga_timeout: parsed("SAGA_TIMEOUT_SECS")
                .map_or(defaults.saga_timeout, Duration::from_secs),
            saga_sweep_interval: parsed("SAGA_SWEEP_INTERVAL_SECS")
                .map_or(defaults.saga_sweep_interval, Duration::from_secs),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reconnect policy shared by every consumer loop.
    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::fixed(self.consumer_backoff, self.consumer_max_retries)
    }

    /// Applies the configured retry settings to a consumer.
    pub fn tune(&self, consumer: ConsumerConfig) -> ConsumerConfig {
        consumer
            .with_backoff(self.backoff())
            .with_consume_error_delay(self.consumer_error_delay)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_json: false,
            database_url: None,
            kafka_brokers: None,
            consumer_group: "booking-group".to_string(),
            history_consumer_group: "history-group".to_string(),
            consumer_max_retries: 10,
            consumer_backoff: Duration::from_millis(5000),
            consumer_error_delay: Duration::from_millis(2000),
            saga_timeout: Duration::from_secs(300),
            saga_sweep_interval: Duration::from_secs(30),
        }
    }
}
