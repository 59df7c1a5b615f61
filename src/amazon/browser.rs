//! Headless Chromium sessions driven over CDP with chromiumoxide.

use crate::amazon::renderer::{RenderOutcome, RenderSession, SessionLauncher};
use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How often the DOM is probed for the ready selector.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// chromiumoxide's default switches minus `--enable-automation`.
const BASE_ARGS: [&str; 21] = [
    "--disable-background-networking",
    "--enable-features=NetworkService,NetworkServiceInProcess",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-breakpad",
    "--disable-client-side-phishing-detection",
    "--disable-component-extensions-with-background-pages",
    "--disable-default-apps",
    "--disable-extensions",
    "--disable-features=TranslateUI",
    "--disable-hang-monitor",
    "--disable-ipc-flooding-protection",
    "--disable-popup-blocking",
    "--disable-prompt-on-repost",
    "--disable-renderer-backgrounding",
    "--disable-sync",
    "--force-color-profile=srgb",
    "--metrics-recording-only",
    "--no-first-run",
    "--password-store=basic",
    "--use-mock-keychain",
];

/// Launches one Chromium process per scrape run.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    headless: bool,
    user_agent: String,
    executable: Option<PathBuf>,
    proxy: Option<String>,
}

impl ChromeLauncher {
    /// Creates a launcher from the application config.
    pub fn new(config: &Config) -> Self {
        Self {
            headless: config.headless,
            user_agent: config.user_agent.clone(),
            executable: config.chrome_executable.clone(),
            proxy: config.proxy.clone(),
        }
    }

    /// Command-line switches passed to Chromium.
    pub fn launch_args(&self) -> Vec<String> {
        let mut args: Vec<String> = BASE_ARGS.iter().map(|a| a.to_string()).collect();

        args.extend(
            [
                "--no-sandbox",
                "--disable-setuid-sandbox",
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--disable-blink-features=AutomationControlled",
                "--lang=fr-FR",
            ]
            .map(String::from),
        );
        args.push(format!("--user-agent={}", self.user_agent));

        if let Some(proxy) = &self.proxy {
            args.push(format!("--proxy-server={}", proxy));
        }

        args
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .disable_default_args()
            .args(self.launch_args())
            .window_size(1920, 1080);

        if !self.headless {
            builder = builder.with_head();
        }

        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(|e| anyhow::anyhow!("Invalid browser config: {}", e))
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn RenderSession>> {
        let config = self.browser_config()?;

        let (browser, mut handler) =
            Browser::launch(config).await.context("Failed to launch Chromium")?;

        // The handler drives the CDP connection and must be polled
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler stopped: {}", e);
                    break;
                }
            }
        });

        info!("Chromium session started (headless: {})", self.headless);

        Ok(Box::new(ChromeSession { browser, handler_task, page: None }))
    }

    fn name(&self) -> &'static str {
        "chrome"
    }
}

/// A running Chromium process with a single reused tab.
pub struct ChromeSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Option<Page>,
}

impl ChromeSession {
    async fn tab(&mut self) -> Result<&Page> {
        if self.page.is_none() {
            let page = self.browser.new_page("about:blank").await.context("Failed to open tab")?;
            self.page = Some(page);
        }
        self.page.as_ref().context("Tab disappeared")
    }
}

#[async_trait]
impl RenderSession for ChromeSession {
    async fn render(
        &mut self,
        url: &str,
        ready_selector: &str,
        timeout: Duration,
    ) -> Result<RenderOutcome> {
        let page = self.tab().await?;

        debug!("Navigating to {}", url);
        page.goto(url).await.with_context(|| format!("Failed to navigate to {}", url))?;

        let deadline = Instant::now() + timeout;
        loop {
            if page.find_element(ready_selector).await.is_ok() {
                let html = page.content().await.context("Failed to read page content")?;
                return Ok(RenderOutcome::Ready(html));
            }

            if Instant::now() >= deadline {
                debug!("'{}' not present after {:?}", ready_selector, timeout);
                return Ok(RenderOutcome::TimedOut);
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("Tab close error: {}", e);
            }
        }

        let closed = self.browser.close().await.context("Failed to close Chromium");
        if closed.is_ok() {
            if let Err(e) = self.browser.wait().await {
                warn!("Failed waiting for Chromium to exit: {}", e);
            }
        }
        self.handler_task.abort();

        debug!("Chromium session closed");
        closed.map(|_| ())
    }
}
