//! Scrape orchestration: one render session, pages visited in order.

use crate::amazon::models::Listing;
use crate::amazon::parser::{ExtractorSettings, ListingExtractor};
use crate::amazon::renderer::{self, RenderOutcome, RenderSession, SessionLauncher};
use crate::amazon::selectors;
use crate::config::Config;
use anyhow::{Context, Result};
use rand::RngExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Knobs for a scrape run.
#[derive(Debug, Clone)]
pub struct ScraperSettings {
    /// Site root for search URLs
    pub base_url: String,
    /// Requested page counts are capped to this
    pub max_pages: u32,
    /// How long a page may take to show product cards
    pub wait_timeout: Duration,
    /// Keep listings from earlier pages when a later page fails hard
    pub keep_partial_results: bool,
    /// Base pause before each page after the first
    pub delay_ms: u64,
    /// Random extra pause (0 to this value)
    pub delay_jitter_ms: u64,
    /// Field extraction settings
    pub extractor: ExtractorSettings,
}

impl ScraperSettings {
    /// Builds scraper settings from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            max_pages: config.max_pages.max(1),
            wait_timeout: config.wait_timeout(),
            keep_partial_results: config.keep_partial_results,
            delay_ms: config.delay_ms,
            delay_jitter_ms: config.delay_jitter_ms,
            extractor: ExtractorSettings::from_config(config),
        }
    }
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Why pagination stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every requested page was processed.
    Completed,
    /// Product cards never appeared on this page.
    TimedOut { page: u32 },
    /// This page rendered but held no product cards.
    EmptyPage { page: u32 },
    /// The session could not be started or a page failed hard.
    Failed,
}

/// Listings of a run plus how the run ended.
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    /// Listings in page-then-card order
    pub listings: Vec<Listing>,
    /// Pages whose markup was extracted
    pub pages_visited: u32,
    pub stop_reason: StopReason,
}

impl ScrapeReport {
    fn new() -> Self {
        Self { listings: Vec::new(), pages_visited: 0, stop_reason: StopReason::Completed }
    }
}

/// Runs search scrapes. Each call opens and closes its own session.
pub struct Scraper {
    launcher: Arc<dyn SessionLauncher>,
    extractor: ListingExtractor,
    settings: ScraperSettings,
}

impl Scraper {
    /// Creates a scraper around the given session launcher.
    pub fn new(launcher: Arc<dyn SessionLauncher>, settings: ScraperSettings) -> Self {
        let extractor = ListingExtractor::new(settings.extractor.clone());
        Self { launcher, extractor, settings }
    }

    /// Creates a scraper using the renderer chosen in the config.
    pub fn from_config(config: &Config) -> Self {
        Self::new(renderer::launcher_for(config), ScraperSettings::from_config(config))
    }

    /// Maximum pages a single scrape may visit.
    pub fn max_pages(&self) -> u32 {
        self.settings.max_pages.max(1)
    }

    /// Scrapes up to `pages` result pages for `term`.
    ///
    /// Never fails: a run-level failure yields an empty list (or the partial
    /// list when `keep_partial_results` is set).
    pub async fn scrape(&self, term: &str, pages: u32) -> Vec<Listing> {
        self.scrape_report(term, pages).await.listings
    }

    /// Like [`Scraper::scrape`], also reporting how pagination ended.
    pub async fn scrape_report(&self, term: &str, pages: u32) -> ScrapeReport {
        let pages = pages.clamp(1, self.settings.max_pages.max(1));
        info!("Starting scrape for '{}' over {} pages ({})", term, pages, self.launcher.name());

        let mut report = ScrapeReport::new();

        let mut session = match self.launcher.launch().await {
            Ok(session) => session,
            Err(e) => {
                error!("Critical error during scraping: {:#}", e);
                report.stop_reason = StopReason::Failed;
                return report;
            }
        };

        let outcome = self.visit_pages(session.as_mut(), term, pages, &mut report).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close {} session: {:#}", self.launcher.name(), e);
        }

        match outcome {
            Ok(reason) => report.stop_reason = reason,
            Err(e) => {
                error!("Critical error during scraping: {:#}", e);
                report.stop_reason = StopReason::Failed;
                if self.settings.keep_partial_results {
                    info!("Keeping {} listings gathered before the failure", report.listings.len());
                } else {
                    report.listings.clear();
                }
            }
        }

        info!("Scraping completed. {} results.", report.listings.len());
        report
    }

    async fn visit_pages(
        &self,
        session: &mut dyn RenderSession,
        term: &str,
        pages: u32,
        report: &mut ScrapeReport,
    ) -> Result<StopReason> {
        for page in 1..=pages {
            if page > 1 {
                self.pause().await;
            }

            let url = renderer::search_url(&self.settings.base_url, term, page);
            info!("Scraping page {}...", page);

            let outcome = session
                .render(&url, selectors::PRODUCT_BLOCK_CSS, self.settings.wait_timeout)
                .await
                .with_context(|| format!("Failed to render page {}", page))?;

            let html = match outcome {
                RenderOutcome::Ready(html) => html,
                RenderOutcome::TimedOut => {
                    warn!("No product blocks found on page {}. Ending pagination.", page);
                    return Ok(StopReason::TimedOut { page });
                }
            };

            let extraction = self.extractor.extract_page(&html, page);
            report.pages_visited += 1;

            if extraction.is_empty() {
                info!("Page {} seems empty. Stopping search.", page);
                return Ok(StopReason::EmptyPage { page });
            }

            report.listings.extend(extraction.listings);
        }

        Ok(StopReason::Completed)
    }

    /// Adds a random delay between page navigations.
    async fn pause(&self) {
        if self.settings.delay_ms == 0 && self.settings.delay_jitter_ms == 0 {
            return;
        }

        let jitter = if self.settings.delay_jitter_ms > 0 {
            rand::rng().random_range(0..=self.settings.delay_jitter_ms)
        } else {
            0
        };

        let total_delay = self.settings.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }
}
