//! Price normalization: total prices and per-kilogram unit prices.
//!
//! Every function here is pure. Unparseable input degrades to `0.0`
//! instead of failing.

use crate::amazon::models::UNIT_PRICE_NOT_FOUND;
use regex_lite::Regex;
use std::sync::LazyLock;

/// Decimal number, euro sign, optional slash, then `kg` or `100g` / `100 g`.
static UNIT_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\d.,\s]+)€\s*(?:/|/\s*|/)?\s*(kg|100\s*g)").unwrap()
});

/// A unit price as printed in a result caption.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitPrice {
    /// Numeric value in EUR per `unit`
    pub value: f64,
    /// Unit token (`kg`, `100g`) or `N/A`
    pub unit: String,
    /// Caption text the price was read from, or `N/A`
    pub raw: String,
}

impl UnitPrice {
    /// The "nothing matched" value.
    pub fn not_found() -> Self {
        Self {
            value: 0.0,
            unit: UNIT_PRICE_NOT_FOUND.to_string(),
            raw: UNIT_PRICE_NOT_FOUND.to_string(),
        }
    }

    /// Returns true if a caption matched.
    pub fn is_found(&self) -> bool {
        self.unit != UNIT_PRICE_NOT_FOUND
    }

    /// Value converted to EUR/kg.
    pub fn per_kg(&self) -> f64 {
        normalize_unit_price(self.value, &self.unit)
    }
}

/// Parses an offscreen price such as `"1 234,56 €"` into `1234.56`.
///
/// Returns `0.0` for anything that does not parse to a finite, non-negative number.
pub fn parse_total_price(text: &str) -> f64 {
    let cleaned = text
        .replace('€', "")
        .replace(['\u{a0}', '\u{202f}', ' '], "")
        .replace(',', ".");

    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
        .unwrap_or(0.0)
}

/// Converts a unit price to EUR/kg. Unknown units and non-positive values give `0.0`.
pub fn normalize_unit_price(value: f64, unit: &str) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }

    match unit.trim().to_lowercase().as_str() {
        "kg" => value,
        "100g" => value * 10.0,
        _ => 0.0,
    }
}

/// Returns the first caption that carries a parseable unit price.
///
/// Captions are expected trimmed. A caption whose number fails to parse
/// (e.g. `"1.234,50 €/kg"`) is skipped and the search continues.
pub fn extract_unit_price<'a>(captions: impl IntoIterator<Item = &'a str>) -> UnitPrice {
    for text in captions {
        // regex-lite's \s is ASCII only, narrow no-break spaces are common in captions
        let haystack = text.replace(['\u{a0}', '\u{202f}'], " ");

        let Some(captures) = UNIT_PRICE.captures(&haystack) else {
            continue;
        };

        let number: String = captures[1]
            .replace(',', ".")
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        let Ok(value) = number.parse::<f64>() else {
            continue;
        };

        let unit: String = captures[2].chars().filter(|c| !c.is_whitespace()).collect();

        return UnitPrice { value, unit, raw: text.to_string() };
    }

    UnitPrice::not_found()
}
