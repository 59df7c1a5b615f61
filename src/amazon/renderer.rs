//! Rendered-page sessions: the seam between the scraper and whatever drives the browser.
//!
//! A [`SessionLauncher`] opens one [`RenderSession`] per scrape run. The session
//! navigates to a URL and waits (bounded) until the ready selector is present;
//! running out of time is an ordinary [`RenderOutcome::TimedOut`], not an error.

use crate::amazon::browser::ChromeLauncher;
use crate::amazon::client::HttpLauncher;
use crate::config::{Config, RendererKind};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of waiting for a page to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The ready selector appeared; carries the full page markup.
    Ready(String),
    /// The ready selector never appeared within the timeout.
    TimedOut,
}

/// Failures a session reports for a single page.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Rate limited by Amazon (503)")]
    RateLimited,

    #[error("Request failed with status: {0}")]
    Status(u16),

    #[error("Invalid ready selector '{0}'")]
    InvalidSelector(String),
}

/// Opens render sessions.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    /// Starts a new session (e.g. launches a browser).
    async fn launch(&self) -> Result<Box<dyn RenderSession>>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// A live session able to render pages one at a time.
#[async_trait]
pub trait RenderSession: Send {
    /// Navigates to `url` and waits up to `timeout` for `ready_selector`.
    async fn render(
        &mut self,
        url: &str,
        ready_selector: &str,
        timeout: Duration,
    ) -> Result<RenderOutcome>;

    /// Releases the session's resources.
    async fn close(&mut self) -> Result<()>;
}

/// Builds the search URL for a term and 1-based page number.
pub fn search_url(base_url: &str, term: &str, page: u32) -> String {
    let mut url =
        format!("{}/s?k={}", base_url.trim_end_matches('/'), urlencoding::encode(term));
    if page > 1 {
        url.push_str(&format!("&page={}", page));
    }
    url
}

/// Returns the launcher selected by the configuration.
pub fn launcher_for(config: &Config) -> Arc<dyn SessionLauncher> {
    match config.renderer {
        RendererKind::Chrome => Arc::new(ChromeLauncher::new(config)),
        RendererKind::Http => Arc::new(HttpLauncher::new(config)),
    }
}
