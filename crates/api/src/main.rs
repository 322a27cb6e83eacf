//! Booking service entry point: HTTP intake, validation result consumer and
//! stale saga sweeper in one process.

use std::process::ExitCode;
use std::sync::Arc;

use api::bootstrap::{self, SharedBus, SharedStore};
use api::config::Config;
use api::{AppState, create_app};
use event_bus::{CancellationToken, ConsumerLoop};
use saga::{ResultConsumer, StaleSagaSweeper, ValidationAggregator};

#[tokio::main]
async fn main() -> ExitCode {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    bootstrap::init_tracing(&config);

    match run(config).await {
        Ok(()) => {
            tracing::info!("booking-service shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "booking-service stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> bootstrap::Result<()> {
    // 2. Install Prometheus metrics recorder
    let metrics_handle = bootstrap::install_metrics()?;

    // 3. Open store (migrations run here) and bus
    let store = bootstrap::open_store(&config).await?;
    let bus = bootstrap::open_bus(&config)?;

    // 4. Start the validation result consumer and the sweeper
    let cancel = CancellationToken::new();
    let aggregator = Arc::new(ValidationAggregator::new(store.clone(), bus.clone()));

    let mut consumer = ConsumerLoop::new(
        bus.clone(),
        ResultConsumer::new(Arc::clone(&aggregator)),
        config.tune(ResultConsumer::<SharedStore, SharedBus>::config(
            &config.consumer_group,
        )),
    );
    let consumer = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let result = consumer.run(cancel.clone()).await;
            // A consumer that gave up takes the whole process down.
            cancel.cancel();
            result
        })
    };

    let sweeper = StaleSagaSweeper::new(
        aggregator,
        config.saga_timeout,
        config.saga_sweep_interval,
    )
    .spawn(cancel.clone());

    // 5. Build the application
    let state = Arc::new(AppState::new(store, bus));
    let app = create_app(state, metrics_handle);

    // 6. Serve until a signal arrives or the consumer stops
    let addr = config.addr();
    tracing::info!(%addr, "starting booking-service");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let stop = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                () = bootstrap::shutdown_signal() => {}
                () = stop.cancelled() => {}
            }
        })
        .await?;

    cancel.cancel();
    sweeper.await?;
    consumer.await??;
    Ok(())
}
