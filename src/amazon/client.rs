//! Plain HTTP render sessions using wreq for TLS fingerprint emulation.
//!
//! No JavaScript runs here: the fetched markup either already contains the
//! ready selector or the page counts as timed out, same as in the browser.

use crate::amazon::renderer::{RenderError, RenderOutcome, RenderSession, SessionLauncher};
use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Opens [`HttpSession`]s with a fresh cookie jar per scrape run.
#[derive(Debug, Clone)]
pub struct HttpLauncher {
    proxy: Option<String>,
    accept_language: String,
}

impl HttpLauncher {
    /// Creates a launcher from the application config.
    pub fn new(config: &Config) -> Self {
        Self { proxy: config.proxy.clone(), accept_language: config.accept_language.clone() }
    }
}

#[async_trait]
impl SessionLauncher for HttpLauncher {
    async fn launch(&self) -> Result<Box<dyn RenderSession>> {
        let session = HttpSession::new(self.proxy.as_deref(), &self.accept_language)
            .context("Failed to create HTTP client")?;
        Ok(Box::new(session))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// HTTP client with browser impersonation.
pub struct HttpSession {
    client: Client,
    accept_language: String,
}

impl HttpSession {
    /// Creates a new session, optionally routed through a proxy.
    pub fn new(proxy: Option<&str>, accept_language: &str) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10));

        // Configure proxy if specified
        if let Some(proxy_url) = proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self { client, accept_language: accept_language.to_string() })
    }

    /// Performs a GET request with browser-like headers.
    async fn get(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8")
            .header("Accept-Language", self.accept_language.as_str())
            .header("Accept-Encoding", "gzip, deflate, br")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Sec-Fetch-User", "?1")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == 503 {
            warn!("Rate limited (503). Consider using a proxy or the chrome renderer.");
            return Err(RenderError::RateLimited.into());
        }

        if !status.is_success() {
            return Err(RenderError::Status(status.as_u16()).into());
        }

        response.text().await.context("Failed to read response body")
    }
}

#[async_trait]
impl RenderSession for HttpSession {
    async fn render(
        &mut self,
        url: &str,
        ready_selector: &str,
        timeout: Duration,
    ) -> Result<RenderOutcome> {
        let Ok(body) = tokio::time::timeout(timeout, self.get(url)).await else {
            debug!("GET {} exceeded {:?}", url, timeout);
            return Ok(RenderOutcome::TimedOut);
        };
        let body = body?;

        if contains_selector(&body, ready_selector)? {
            Ok(RenderOutcome::Ready(body))
        } else {
            Ok(RenderOutcome::TimedOut)
        }
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

fn contains_selector(html: &str, css: &str) -> Result<bool> {
    let selector =
        Selector::parse(css).map_err(|_| RenderError::InvalidSelector(css.to_string()))?;
    Ok(Html::parse_document(html).select(&selector).next().is_some())
}
