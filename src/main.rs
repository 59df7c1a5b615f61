//! amz-unit-price - Amazon.fr search results ranked by price per kilogram
//!
//! Scrapes search result pages with a headless browser and serves the
//! normalized listings over a small HTTP API.

use amz_unit_price::commands::{SearchCommand, ServeCommand};
use amz_unit_price::config::{Config, OutputFormat, RendererKind};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "amz-unit-price",
    version,
    about = "Amazon.fr product search with prices per kilogram",
    long_about = "Scrapes Amazon.fr search results with headless Chromium, normalizes unit prices to €/kg and serves them over a small web API."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Page renderer (chrome, http)
    #[arg(long, global = true, env = "AMZ_RENDERER")]
    renderer: Option<RendererKind>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "AMZ_PROXY")]
    proxy: Option<String>,

    /// Show the browser window
    #[arg(long, global = true)]
    headful: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web API and landing page
    Serve {
        /// Address to listen on (host:port)
        #[arg(short, long, env = "AMZ_BIND")]
        bind: Option<String>,
    },

    /// Run a single search and print the results
    #[command(alias = "s")]
    Search {
        /// Search query
        query: String,

        /// Number of result pages to scrape
        #[arg(short, long)]
        pages: Option<u32>,

        /// Output format
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Include listings without a total or per-kilo price
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()))
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(renderer) = cli.renderer {
        config.renderer = renderer;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if cli.headful {
        config.headless = false;
    }

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }

            ServeCommand::new(config).execute().await?;
        }

        Commands::Search { query, pages, format, all } => {
            if let Some(format) = format {
                config.format = format;
            }

            let cmd = SearchCommand::new(config).pages(pages).include_unpriced(all);
            let output = cmd.execute(&query).await?;
            println!("{}", output);
        }
    }

    Ok(())
}
