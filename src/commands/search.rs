//! Search command implementation.

use crate::amazon::models::Listing;
use crate::amazon::scraper::{Scraper, StopReason};
use crate::config::Config;
use crate::format::Formatter;
use anyhow::Result;
use tracing::{debug, info, warn};

/// Executes a one-shot scrape and formats the result.
pub struct SearchCommand {
    config: Config,
    pages: Option<u32>,
    include_unpriced: bool,
}

impl SearchCommand {
    /// Creates a new search command.
    pub fn new(config: Config) -> Self {
        Self { config, pages: None, include_unpriced: false }
    }

    /// Number of result pages to visit (defaults to the configured maximum).
    pub fn pages(mut self, pages: Option<u32>) -> Self {
        self.pages = pages;
        self
    }

    /// Also print listings lacking a total or per-kilo price.
    pub fn include_unpriced(mut self, include: bool) -> Self {
        self.include_unpriced = include;
        self
    }

    /// Executes the search and returns formatted output.
    pub async fn execute(&self, query: &str) -> Result<String> {
        let scraper = Scraper::from_config(&self.config);
        self.execute_with_scraper(&scraper, query).await
    }

    /// Executes the search with a provided scraper (for testing).
    pub async fn execute_with_scraper(&self, scraper: &Scraper, query: &str) -> Result<String> {
        let query = query.trim();
        if query.is_empty() {
            anyhow::bail!("Search query must not be empty");
        }

        let pages = self.pages.unwrap_or(scraper.max_pages());
        info!("Searching for: {}", query);

        let report = scraper.scrape_report(query, pages).await;
        match report.stop_reason {
            StopReason::Failed => warn!("Scrape failed; results may be empty"),
            reason => debug!("Stopped after {} pages: {:?}", report.pages_visited, reason),
        }

        let total = report.listings.len();
        let listings: Vec<Listing> = if self.include_unpriced {
            report.listings
        } else {
            report.listings.into_iter().filter(Listing::is_priced).collect()
        };

        info!("Found {} listings ({} scraped)", listings.len(), total);

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_listings(&listings))
    }
}
