mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "odoscan")]
#[command(about = "Odometer mileage claims and payment-journal summaries from photos")]
#[command(version)]
pub struct Cli {
    /// Config file (TOML). Defaults to the platform config directory.
    #[arg(long, global = true, env = "ODOSCAN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find the odometer value in OCR text
    Extract {
        /// Text file, or `-` for stdin
        input: PathBuf,
    },
    /// Distance and cost between two odometer readings
    Reconcile { first: u64, second: u64 },
    /// Read both odometer photos and reconcile the trip
    Mileage { start_image: PathBuf, end_image: PathBuf },
    /// Summarize payment-journal OCR text
    Summarize {
        /// Text file, or `-` for stdin
        input: PathBuf,
        /// Use the configured external summarizer command
        #[arg(long)]
        script: bool,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the HTTP server
    Serve {
        /// Overrides `server.bind`
        #[arg(short, long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    odoscan_server::telemetry::init("odoscan");

    let cli = Cli::parse();
    let config = odoscan_server::load_config(cli.config.clone())?;

    match cli.command {
        Commands::Extract { input } => commands::extract(&input).await,
        Commands::Reconcile { first, second } => commands::reconcile(&config, first, second),
        Commands::Mileage { start_image, end_image } => {
            commands::mileage(config, &start_image, &end_image).await
        }
        Commands::Summarize { input, script, json } => {
            commands::summarize(&config, &input, script, json).await
        }
        Commands::Serve { bind } => commands::serve(config, bind).await,
    }
}
