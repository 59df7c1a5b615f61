//! Data models for scraped search listings.

use serde::{Deserialize, Serialize};

/// Title used when a product block has no title node.
pub const TITLE_NOT_FOUND: &str = "Titre non trouvé";

/// Link used when no anchor in a block points at a product page.
pub const LINK_NOT_FOUND: &str = "Lien non trouvé";

/// Sentinel for a missing unit price (both raw text and unit token).
pub const UNIT_PRICE_NOT_FOUND: &str = "N/A";

/// Products per search page, used to keep `product_id` indices unique across pages.
pub const RESULTS_PER_PAGE: usize = 60;

const FNV1A64_OFFSET: u64 = 0xcbf29ce484222325;
const FNV1A64_PRIME: u64 = 0x100000001b3;

/// One product listing extracted from a search result page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Display title, possibly truncated with `...`
    pub title: String,
    /// Total price in EUR (0.0 when absent or unparseable)
    pub total_price: f64,
    /// Caption text the unit price was read from, or `N/A`
    pub unit_price_raw: String,
    /// Unit price normalized to EUR/kg (0.0 when unknown)
    pub unit_price_kg: f64,
    /// Absolute product URL without query string
    pub link: String,
    /// Identifier unique within one scrape run
    pub product_id: String,
}

impl Listing {
    /// Returns true if both the total price and the per-kg price are known.
    pub fn is_priced(&self) -> bool {
        self.total_price > 0.0 && self.unit_price_kg > 0.0
    }

    /// Returns true if a title node was found for this listing.
    pub fn has_title(&self) -> bool {
        self.title != TITLE_NOT_FOUND
    }

    /// Returns true if a product link was found for this listing.
    pub fn has_link(&self) -> bool {
        self.link != LINK_NOT_FOUND
    }
}

/// Result of extracting one rendered search page.
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    /// 1-based page number
    pub page: u32,
    /// Number of product blocks present in the markup
    pub block_count: usize,
    /// Listings kept after dropping blocks without a title
    pub listings: Vec<Listing>,
}

impl PageExtraction {
    /// Returns true if the page contained no product blocks at all.
    pub fn is_empty(&self) -> bool {
        self.block_count == 0
    }
}

/// Builds the run-unique identifier `prod_{index}_{hash}`.
///
/// The hash is FNV-1a 64 over the title followed by the `{:?}` rendering of
/// the price, so identifiers are reproducible across processes.
pub fn product_id(index: usize, title: &str, total_price: f64) -> String {
    let key = format!("{}{:?}", title, total_price);
    format!("prod_{}_{:016x}", index, fnv1a_64(&key))
}

fn fnv1a_64(input: &str) -> u64 {
    let mut hash = FNV1A64_OFFSET;
    for byte in input.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV1A64_PRIME);
    }
    hash
}
