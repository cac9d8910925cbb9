mod config;
mod crawler;
mod models;
mod pipeline;
mod snapshot;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};
use tracing_subscriber::prelude::*;

use crate::config::AppConfig;
use crate::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "fitment-crawler", about = "Vehicle fitment snapshot crawler", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Run one crawl against the configured storefront and write a snapshot
    Crawl {
        /// Override the configured output directory
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Print the resolved configuration and exit
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "fitment_crawler=info,warn",
        1 => "fitment_crawler=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let mut config = AppConfig::load()?;

    match cli.command {
        Command::Crawl { out_dir } => {
            if let Some(dir) = out_dir {
                config.output.dir = dir;
            }

            let stats = Pipeline::new(config).run().await?;

            println!("─────────────────────────────────");
            println!("  Fitment Crawl — Summary");
            println!("─────────────────────────────────");
            println!("  Brands   : {}", stats.brands);
            println!("  Models   : {}", stats.models);
            println!("  Products : {}", stats.products);
            println!("  Snapshot : {}", stats.snapshot_path.display());
            println!("─────────────────────────────────");
        }

        Command::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
