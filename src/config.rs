//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site root used for search URLs and product links
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Address the HTTP API binds to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Upper bound for pages per scrape
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Titles longer than this are truncated with "..."
    #[serde(default = "default_max_title_length")]
    pub max_title_length: usize,

    /// Seconds to wait for product cards to appear on a page
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,

    /// Page renderer backend
    #[serde(default)]
    pub renderer: RendererKind,

    /// Run the browser without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// User-Agent presented by the renderer
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Accept-Language sent by the HTTP renderer
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Chrome/Chromium binary; auto-detected when unset
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Base delay between page navigations in milliseconds
    #[serde(default)]
    pub delay_ms: u64,

    /// Random jitter added to delay (0 to this value)
    #[serde(default)]
    pub delay_jitter_ms: u64,

    /// Return listings gathered before a run-level failure instead of nothing
    #[serde(default)]
    pub keep_partial_results: bool,

    /// Landing page served at `/`
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Directory served under `/static`
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Output format for the search command
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_base_url() -> String {
    "https://www.amazon.fr".to_string()
}

fn default_bind() -> String {
    "0.0.0.0:5001".to_string()
}

fn default_max_pages() -> u32 {
    50
}

fn default_max_title_length() -> usize {
    50
}

fn default_wait_timeout_secs() -> u64 {
    15
}

fn default_headless() -> bool {
    true
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

fn default_accept_language() -> String {
    "fr-FR,fr;q=0.9,en;q=0.8".to_string()
}

fn default_index_path() -> PathBuf {
    PathBuf::from("templates/index.html")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            bind: default_bind(),
            max_pages: default_max_pages(),
            max_title_length: default_max_title_length(),
            wait_timeout_secs: default_wait_timeout_secs(),
            renderer: RendererKind::Chrome,
            headless: default_headless(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            chrome_executable: None,
            proxy: None,
            delay_ms: 0,
            delay_jitter_ms: 0,
            keep_partial_results: false,
            index_path: default_index_path(),
            static_dir: default_static_dir(),
            format: OutputFormat::Table,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("amz-unit-price").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(base_url) = std::env::var("AMZ_BASE_URL") {
            self.base_url = base_url;
        }

        if let Ok(bind) = std::env::var("AMZ_BIND") {
            self.bind = bind;
        }

        if let Ok(renderer) = std::env::var("AMZ_RENDERER") {
            if let Ok(r) = renderer.parse() {
                self.renderer = r;
            }
        }

        if let Ok(proxy) = std::env::var("AMZ_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(max_pages) = std::env::var("AMZ_MAX_PAGES") {
            if let Ok(n) = max_pages.parse() {
                self.max_pages = n;
            }
        }

        if let Ok(chrome) = std::env::var("AMZ_CHROME") {
            self.chrome_executable = Some(PathBuf::from(chrome));
        }

        self
    }

    /// Page readiness timeout as a duration.
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

/// Backend used to obtain rendered search pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Headless Chromium driven over CDP
    #[default]
    Chrome,
    /// Plain HTTP GET with browser TLS emulation (no JavaScript)
    Http,
}

impl std::str::FromStr for RendererKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chrome" | "chromium" => Ok(RendererKind::Chrome),
            "http" => Ok(RendererKind::Http),
            _ => Err(format!("Unknown renderer: {}. Use: chrome, http", s)),
        }
    }
}

impl std::fmt::Display for RendererKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RendererKind::Chrome => write!(f, "chrome"),
            RendererKind::Http => write!(f, "http"),
        }
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.base_url, "https://www.amazon.fr");
        assert_eq!(config.bind, "0.0.0.0:5001");
        assert_eq!(config.max_pages, 50);
        assert_eq!(config.max_title_length, 50);
        assert_eq!(config.wait_timeout_secs, 15);
        assert_eq!(config.wait_timeout(), Duration::from_secs(15));
        assert_eq!(config.renderer, RendererKind::Chrome);
        assert!(config.headless);
        assert!(config.user_agent.contains("Chrome/120"));
        assert!(config.chrome_executable.is_none());
        assert!(config.proxy.is_none());
        assert_eq!(config.delay_ms, 0);
        assert_eq!(config.delay_jitter_ms, 0);
        assert!(!config.keep_partial_results);
        assert_eq!(config.index_path, PathBuf::from("templates/index.html"));
        assert_eq!(config.static_dir, PathBuf::from("static"));
        assert_eq!(config.format, OutputFormat::Table);
    }

    #[test]
    fn test_renderer_parsing() {
        assert_eq!("chrome".parse::<RendererKind>().unwrap(), RendererKind::Chrome);
        assert_eq!("Chromium".parse::<RendererKind>().unwrap(), RendererKind::Chrome);
        assert_eq!("HTTP".parse::<RendererKind>().unwrap(), RendererKind::Http);

        let err = "firefox".parse::<RendererKind>().unwrap_err();
        assert!(err.contains("Unknown renderer"));
    }

    #[test]
    fn test_renderer_display() {
        assert_eq!(RendererKind::Chrome.to_string(), "chrome");
        assert_eq!(RendererKind::Http.to_string(), "http");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);

        let err = "invalid".parse::<OutputFormat>().unwrap_err();
        assert!(err.contains("Unknown format"));
        assert!(err.contains("table, json, markdown, csv"));
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Markdown.to_string(), "markdown");
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            base_url = "https://www.amazon.de"
            max_pages = 5
            renderer = "http"
            keep_partial_results = true
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.base_url, "https://www.amazon.de");
        assert_eq!(config.max_pages, 5);
        assert_eq!(config.renderer, RendererKind::Http);
        assert!(config.keep_partial_results);
        // untouched fields keep their defaults
        assert_eq!(config.wait_timeout_secs, 15);
        assert!(config.headless);
    }

    #[test]
    fn test_config_from_toml_all_fields() {
        let toml = r#"
            base_url = "https://www.amazon.fr"
            bind = "127.0.0.1:8080"
            max_pages = 10
            max_title_length = 80
            wait_timeout_secs = 30
            renderer = "chrome"
            headless = false
            user_agent = "test-agent"
            accept_language = "de-DE"
            chrome_executable = "/usr/bin/chromium"
            proxy = "socks5://localhost:1080"
            delay_ms = 500
            delay_jitter_ms = 250
            keep_partial_results = true
            index_path = "web/index.html"
            static_dir = "web/static"
            format = "csv"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.bind, "127.0.0.1:8080");
        assert_eq!(config.max_pages, 10);
        assert_eq!(config.max_title_length, 80);
        assert_eq!(config.wait_timeout_secs, 30);
        assert!(!config.headless);
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.accept_language, "de-DE");
        assert_eq!(config.chrome_executable, Some(PathBuf::from("/usr/bin/chromium")));
        assert_eq!(config.proxy, Some("socks5://localhost:1080".to_string()));
        assert_eq!(config.delay_ms, 500);
        assert_eq!(config.delay_jitter_ms, 250);
        assert_eq!(config.index_path, PathBuf::from("web/index.html"));
        assert_eq!(config.static_dir, PathBuf::from("web/static"));
        assert_eq!(config.format, OutputFormat::Csv);
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            max_pages = 3
            wait_timeout_secs = 5
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.max_pages, 3);
        assert_eq!(config.wait_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_config_from_file_not_found() {
        let result = Config::from_file("/nonexistent/path/config.toml");
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let result = Config::from_file(file.path());
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"bind = "127.0.0.1:9000""#).unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.bind, "127.0.0.1:9000");
    }

    #[test]
    fn test_config_with_env() {
        let vars = ["AMZ_BASE_URL", "AMZ_RENDERER", "AMZ_MAX_PAGES", "AMZ_CHROME"];
        let saved: Vec<_> = vars.iter().map(|v| std::env::var(v).ok()).collect();

        std::env::set_var("AMZ_BASE_URL", "https://www.amazon.es");
        std::env::set_var("AMZ_RENDERER", "http");
        std::env::set_var("AMZ_MAX_PAGES", "not_a_number");
        std::env::set_var("AMZ_CHROME", "/opt/chrome/chrome");

        let config = Config::new().with_env();
        assert_eq!(config.base_url, "https://www.amazon.es");
        assert_eq!(config.renderer, RendererKind::Http);
        // invalid values are ignored
        assert_eq!(config.max_pages, 50);
        assert_eq!(config.chrome_executable, Some(PathBuf::from("/opt/chrome/chrome")));

        for (var, value) in vars.iter().zip(saved) {
            match value {
                Some(v) => std::env::set_var(var, v),
                None => std::env::remove_var(var),
            }
        }
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config {
            max_pages: 7,
            renderer: RendererKind::Http,
            proxy: Some("http://proxy:8080".to_string()),
            format: OutputFormat::Json,
            ..Config::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.max_pages, config.max_pages);
        assert_eq!(parsed.renderer, config.renderer);
        assert_eq!(parsed.proxy, config.proxy);
        assert_eq!(parsed.format, config.format);
    }
}
