//! Reindexer main entry point.
//!
//! Rebuilds the person search index from a CSV file and promotes the new
//! index atomically behind the stable alias. Exit code 0 on a completed
//! run, non-zero on any stage failure.

use dotenv::dotenv;
use reindexer::{Dependencies, ReindexConfig, ReindexerError};
use reindexer_pipeline::orchestrator::RunStatus;
use std::env;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("reindexer=info,reindexer_pipeline=info"));

    let json_logs = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();
    }

    info!(
        service_name = "reindexer",
        service_version = env!("CARGO_PKG_VERSION"),
        "Tracing initialized"
    );
}

#[tokio::main]
async fn main() -> Result<(), ReindexerError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing();

    info!("Starting people reindexer");

    let config = ReindexConfig::from_env()?;
    let mut deps = Dependencies::new(&config).await?;

    // Ctrl-C aborts the run at the next stage or record boundary.
    let shutdown = deps.orchestrator.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            let _ = shutdown.send(());
        }
    });

    let run = deps.orchestrator.run().await;

    for stage in &run.stages {
        match &stage.error {
            None => info!(stage = %stage.stage, "Stage completed"),
            Some(cause) => error!(stage = %stage.stage, cause = %cause, "Stage failed"),
        }
    }

    match run.status {
        RunStatus::Completed => {
            info!(index = %run.target_index, "Reindex completed");
            Ok(())
        }
        RunStatus::Failed { stage, cause } => {
            error!(stage = %stage, error = %cause, "Reindex failed");
            Err(cause.into())
        }
    }
}
