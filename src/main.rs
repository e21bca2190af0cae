mod config;
mod learn;
mod loader;
mod models;
mod pipeline;
mod prep;
mod report;
mod scraper;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(
    name = "campus-scout",
    about = "College rankings scraper + census income models",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape ranked college search pages into one table
    Scrape {
        /// How many result pages to fetch
        #[arg(short, long, default_value_t = 5)]
        pages: u32,

        /// Write the assembled table to this CSV file
        #[arg(long)]
        out: Option<PathBuf>,

        /// Also print the table as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the census income modeling pipeline end to end
    Train {
        /// Census data file (default: data config)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Companion names file (default: data config)
        #[arg(long)]
        names: Option<PathBuf>,
    },

    /// Clean the census data and report what survives, without fitting
    Inspect {
        #[arg(long)]
        data: Option<PathBuf>,

        #[arg(long)]
        names: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "campus_scout=info,warn",
        1 => "campus_scout=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Scrape { pages, out, json } => {
            let _t = utils::Timer::start("Scrape run");
            let stats = pipeline::run_scrape(&config, pages, out.as_deref(), json).await?;
            info!(
                "Done: {} pages requested, {} records",
                stats.pages_requested, stats.records
            );
        }

        Command::Train { data, names } => {
            let _t = utils::Timer::start("Training run");
            pipeline::run_training(&config, data.as_deref(), names.as_deref())?;
        }

        Command::Inspect { data, names } => {
            pipeline::run_inspect(&config, data.as_deref(), names.as_deref())?;
        }
    }

    Ok(())
}
