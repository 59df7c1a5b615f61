//! Amazon-specific modules: rendering, parsing, price normalization and data models.

pub mod browser;
pub mod client;
pub mod models;
pub mod parser;
pub mod pricing;
pub mod renderer;
pub mod scraper;
pub mod selectors;

pub use models::{Listing, PageExtraction};
pub use parser::{ExtractorSettings, ListingExtractor};
pub use renderer::{RenderOutcome, RenderSession, SessionLauncher};
pub use scraper::{ScrapeReport, Scraper, ScraperSettings, StopReason};
