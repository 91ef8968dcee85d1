//! Checkout driver entry point.

use std::process;

use clap::Parser;
use cli::Config;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // Logs go to stderr so stdout carries only command output.
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = commands::Cli::parse();

    if let Err(error) = run(cli, &config).await {
        eprintln!("{error}");
        process::exit(1);
    }
}

async fn run(cli: commands::Cli, config: &Config) -> Result<(), String> {
    let metrics = if cli.metrics {
        Some(install_metrics()?)
    } else {
        None
    };

    let result = cli.run(config).await;

    if let Some(handle) = metrics {
        println!("{}", handle.render());
    }
    result
}

fn install_metrics() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|error| format!("failed to install Prometheus recorder: {error}"))
}
