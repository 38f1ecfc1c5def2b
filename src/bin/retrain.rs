//! retrain CLI: touch one intent or entity per workspace so the
//! assistant service retrains it.

use clap::Parser;
use std::path::PathBuf;
use wksp_retrain::assistant::AssistantClient;
use wksp_retrain::config::{Config, DEFAULT_CONFIG_FILE};
use wksp_retrain::sweep::{Sweep, SweepConfig};
use wksp_retrain::telemetry::{TelemetryConfig, init_telemetry};

#[derive(Parser)]
#[command(
    name = "retrain",
    version,
    about = "Trigger retraining of every Watson Assistant workspace on an instance"
)]
struct Cli {
    /// Path to the TOML config holding the instance URL, API key and IAM URL
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Config errors abort before anything touches the network.
    let config = Config::load(&cli.config)?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "wksp-retrain".to_string(),
        default_filter: config.log_level.clone(),
    })?;

    let client = AssistantClient::new(&config)?;
    let mut sweep = Sweep::new(SweepConfig::default()).show_progress();
    let report = sweep.run(&client).await?;

    println!(
        "Updated {} workspace(s): {} retrained, {} failed. {} skipped, {} cooldown(s).",
        report.processed(),
        report.retrained.len(),
        report.failed.len(),
        report.skipped.len(),
        report.pauses
    );
    if !report.failed.is_empty() {
        println!(
            "Workspaces to retrain by hand were appended to {}:",
            sweep.retry_log().path().display()
        );
        for id in &report.failed {
            println!("  {id}");
        }
    }

    Ok(())
}
