//! Field extraction for Amazon search result cards.
//!
//! Every field degrades to a documented default when its node is missing,
//! so one malformed card never aborts a page.

use crate::amazon::models::{
    product_id, Listing, PageExtraction, LINK_NOT_FOUND, RESULTS_PER_PAGE, TITLE_NOT_FOUND,
};
use crate::amazon::pricing::{self, UnitPrice};
use crate::amazon::selectors;
use crate::config::Config;
use scraper::{ElementRef, Html};
use tracing::{debug, trace};

/// Fallback text when a card has no offscreen price.
const ZERO_PRICE_TEXT: &str = "0,00 €";

/// Path fragments that identify a product detail link.
const PRODUCT_PATH_MARKERS: [&str; 2] = ["/dp/", "/gp/product/"];

/// Settings that shape extracted fields.
#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    /// Site root prepended to relative product links
    pub base_url: String,
    /// Titles longer than this many characters are cut and suffixed with `...`
    pub max_title_length: usize,
}

impl ExtractorSettings {
    /// Builds extractor settings from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_title_length: config.max_title_length,
        }
    }
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Turns search result markup into [`Listing`] records.
#[derive(Debug, Clone)]
pub struct ListingExtractor {
    settings: ExtractorSettings,
}

impl ListingExtractor {
    /// Creates a new extractor.
    pub fn new(settings: ExtractorSettings) -> Self {
        Self { settings }
    }

    /// Parses a rendered search page and extracts every product card.
    ///
    /// Cards without a title node are dropped; `block_count` still counts them.
    pub fn extract_page(&self, html: &str, page: u32) -> PageExtraction {
        let document = Html::parse_document(html);
        let first_index = (page.max(1) as usize - 1) * RESULTS_PER_PAGE;

        let mut extraction = PageExtraction { page, ..Default::default() };

        for (position, block) in document.select(&selectors::PRODUCT_BLOCK).enumerate() {
            extraction.block_count += 1;

            let listing = self.extract_listing(block, first_index + position);
            if !listing.has_title() {
                debug!("Skipping card #{} on page {}: no title", position, page);
                continue;
            }

            trace!("Parsed listing: {} - {}", listing.product_id, listing.title);
            extraction.listings.push(listing);
        }

        debug!(
            "Extracted {} listings from {} cards on page {}",
            extraction.listings.len(),
            extraction.block_count,
            page
        );

        extraction
    }

    /// Extracts one card. `index` must be unique within the scrape run.
    pub fn extract_listing(&self, block: ElementRef, index: usize) -> Listing {
        let title = self.extract_title(block);
        let total_price = self.extract_total_price(block);
        let link = self.extract_link(block);
        let unit_price = self.extract_unit_price(block);
        if !unit_price.is_found() {
            trace!("No unit price caption on card #{}", index);
        }

        Listing {
            product_id: product_id(index, &title, total_price),
            title,
            total_price,
            unit_price_kg: unit_price.per_kg(),
            unit_price_raw: unit_price.raw,
            link,
        }
    }

    /// Title text, truncated to the configured length.
    pub fn extract_title(&self, block: ElementRef) -> String {
        let Some(element) = block.select(&selectors::TITLE).next() else {
            return TITLE_NOT_FOUND.to_string();
        };

        let full_title = element.text().collect::<String>();
        let full_title = full_title.trim();

        if full_title.chars().count() > self.settings.max_title_length {
            let cut: String = full_title.chars().take(self.settings.max_title_length).collect();
            format!("{}...", cut.trim_end())
        } else {
            full_title.to_string()
        }
    }

    /// Offscreen total price, `0.0` when missing or unparseable.
    pub fn extract_total_price(&self, block: ElementRef) -> f64 {
        let text = block
            .select(&selectors::TOTAL_PRICE)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .unwrap_or_else(|| ZERO_PRICE_TEXT.to_string());

        pricing::parse_total_price(&text)
    }

    /// First root-relative product link, made absolute and stripped of its query.
    ///
    /// Cards carry many non-product anchors (sponsored labels, review counts),
    /// so the first anchor overall is rarely the right one.
    pub fn extract_link(&self, block: ElementRef) -> String {
        block
            .select(&selectors::LINK)
            .filter_map(|a| a.value().attr("href"))
            .find(|href| {
                href.starts_with('/')
                    && PRODUCT_PATH_MARKERS.iter().any(|marker| href.contains(marker))
            })
            .map(|href| {
                let link = format!("{}{}", self.settings.base_url, href);
                match link.split_once('?') {
                    Some((path, _query)) => path.to_string(),
                    None => link,
                }
            })
            .unwrap_or_else(|| LINK_NOT_FOUND.to_string())
    }

    /// First secondary caption holding a unit price.
    pub fn extract_unit_price(&self, block: ElementRef) -> UnitPrice {
        let captions: Vec<String> = block
            .select(&selectors::UNIT_PRICE_BLOCK)
            .map(|e| e.text().collect::<String>().trim().to_string())
            .collect();

        pricing::extract_unit_price(captions.iter().map(String::as_str))
    }
}

impl Default for ListingExtractor {
    fn default() -> Self {
        Self::new(ExtractorSettings::default())
    }
}
