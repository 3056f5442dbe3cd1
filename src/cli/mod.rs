pub mod commands;
pub mod config;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a listing page and every article it links to
    Crawl(CrawlArgs),

    /// Show the effective configuration
    Config {
        /// Configuration file to show instead of the default one
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the built-in defaults to the default configuration file
        #[arg(long)]
        init: bool,
    },
}

/// Options for a crawl; each one overrides the configuration file
#[derive(Args, Debug, Default)]
pub struct CrawlArgs {
    /// Configuration file (defaults to the saved default configuration)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// URL of the first page to visit
    #[arg(short = 'u', long)]
    pub start_url: Option<String>,

    /// Role of the first page (LISTING or ARTICLE)
    #[arg(long)]
    pub role: Option<String>,

    /// CSS selector for article links on the listing page
    #[arg(long)]
    pub listing_selector: Option<String>,

    /// CSS selector for the article title
    #[arg(long)]
    pub title_selector: Option<String>,

    /// CSS selector for the article body container
    #[arg(long)]
    pub body_selector: Option<String>,

    /// Per-page fetch timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Extra attempts after a failed fetch
    #[arg(short, long)]
    pub retries: Option<u32>,

    /// Page fetcher to use (http or webdriver)
    #[arg(short, long)]
    pub fetcher: Option<String>,

    /// JSON Lines file receiving extracted records
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory receiving diagnostic HTML snapshots
    #[arg(long)]
    pub diagnostics_dir: Option<PathBuf>,
}

/// Parse command line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Process the command
pub async fn process_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Crawl(args) => {
            info!("Starting crawl");
            commands::crawl(args).await.map(|_| ())
        }
        Commands::Config { config, init } => {
            if init {
                info!("Writing default configuration");
                commands::init_config()
            } else {
                commands::show_config(config)
            }
        }
    }
}
