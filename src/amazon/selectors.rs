//! CSS selectors for the Amazon search results layout.
//!
//! This file contains all CSS selectors used for parsing search pages.
//! Update this file when Amazon changes their HTML structure.
//!
//! **Update process**: When parsing fails, capture HTML sample,
//! update selectors, and update the test fixture.

use scraper::Selector;
use std::sync::LazyLock;

/// Raw form of [`PRODUCT_BLOCK`], used by renderers to wait for results.
pub const PRODUCT_BLOCK_CSS: &str = r#"div[data-component-type="s-search-result"]"#;

/// Product card container - one search result listing.
pub static PRODUCT_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(PRODUCT_BLOCK_CSS).unwrap());

/// Product title text.
pub static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2 span").unwrap());

/// Every anchor in a card; the product link is filtered out of these.
pub static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

/// Screen-reader copy of the current price (e.g. "12,34 €").
pub static TOTAL_PRICE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".a-price .a-offscreen").unwrap());

/// Secondary captions, one of which usually holds the unit price.
pub static UNIT_PRICE_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.a-size-base.a-color-secondary").unwrap());
