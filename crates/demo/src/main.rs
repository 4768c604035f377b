//! Demo entry point.

use std::process::ExitCode;

use demo::config::Config;
use demo::{build_system, scenario, telemetry};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "demo failed");
            eprintln!("demo failed: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> demo::error::Result<()> {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env()?;
    telemetry::init_tracing(&config)?;
    tracing::info!(?config, "configuration loaded");

    // 2. Install Prometheus metrics recorder
    let metrics_handle = telemetry::init_metrics(&config)?;

    // 3. Wire store, dispatchers, handlers and services
    let system = build_system(&config);

    // 4. Run the reference scenario
    let report = scenario::run(&system).await?;
    tracing::info!(
        records = system.store.record_count().await,
        rejections = ?report.rejections,
        "demo complete"
    );

    if let Some(handle) = metrics_handle {
        println!("{}", handle.render());
    }
    Ok(())
}
