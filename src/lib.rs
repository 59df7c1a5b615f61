//! amz-unit-price - Amazon.fr search results ranked by price per kilogram
//!
//! Renders search result pages, extracts each product card defensively and
//! normalizes "€/kg" and "€/100 g" captions into a single per-kilogram price.

pub mod amazon;
pub mod api;
pub mod commands;
pub mod config;
pub mod format;

pub use amazon::models::Listing;
pub use amazon::scraper::{Scraper, ScraperSettings};
pub use config::Config;
