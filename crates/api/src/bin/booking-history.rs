//! History recorder entry point: consumes booking outcomes into the audit log.

use std::process::ExitCode;

use api::bootstrap::{self, SharedStore};
use api::config::Config;
use api::create_ops_app;
use event_bus::{CancellationToken, ConsumerLoop};
use history::HistoryRecorder;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::from_env();
    bootstrap::init_tracing(&config);

    match run(config).await {
        Ok(()) => {
            tracing::info!("booking-history shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "booking-history stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> bootstrap::Result<()> {
    let metrics_handle = bootstrap::install_metrics()?;
    let store = bootstrap::open_store(&config).await?;
    let bus = bootstrap::open_bus(&config)?;

    let cancel = CancellationToken::new();
    let mut recorder = ConsumerLoop::new(
        bus,
        HistoryRecorder::new(store),
        config.tune(HistoryRecorder::<SharedStore>::config(
            &config.history_consumer_group,
        )),
    );
    let consumer = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let result = recorder.run(cancel.clone()).await;
            cancel.cancel();
            result
        })
    };

    // Health and metrics only; outcomes arrive through the bus.
    let addr = config.addr();
    tracing::info!(%addr, "starting booking-history");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let stop = cancel.clone();
    axum::serve(listener, create_ops_app(metrics_handle))
        .with_graceful_shutdown(async move {
            tokio::select! {
                () = bootstrap::shutdown_signal() => {}
                () = stop.cancelled() => {}
            }
        })
        .await?;

    cancel.cancel();
    consumer.await??;
    Ok(())
}
