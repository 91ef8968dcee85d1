use std::path::PathBuf;

use backend::HttpBackend;
use clap::{Args, Parser, Subcommand};
use cli::Config;

mod pay;
mod totals;

#[derive(Debug, Parser)]
#[command(name = "checkout", about = "Dry-cleaning checkout driver", long_about = None)]
pub(crate) struct Cli {
    /// Print Prometheus metrics after the command
    #[arg(long, global = true)]
    pub(crate) metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve pricing and print the order summary
    Totals(DraftArgs),
    /// Book and pay for the draft
    Pay(DraftArgs),
}

#[derive(Debug, Args)]
pub(crate) struct DraftArgs {
    /// Path to the checkout draft (JSON)
    draft: PathBuf,
}

impl Cli {
    pub(crate) async fn run(self, config: &Config) -> Result<(), String> {
        match self.command {
            Commands::Totals(args) => totals::run(args, config).await,
            Commands::Pay(args) => pay::run(args, config).await,
        }
    }
}

fn connect(config: &Config) -> Result<HttpBackend, String> {
    HttpBackend::new(config.backend_config())
        .map_err(|error| format!("failed to create backend client: {error}"))
}
