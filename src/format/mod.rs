//! Output formatting for listings (table, JSON, markdown, CSV).

use crate::amazon::models::Listing;
use crate::config::OutputFormat;

const CSV_HEADER: &str = "product_id,title,total_price,unit_price_kg,unit_price_raw,link";

/// Formats listings for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a list of listings.
    pub fn format_listings(&self, listings: &[Listing]) -> String {
        if listings.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => CSV_HEADER.to_string(),
                _ => "No products found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => self.json_listings(listings),
            OutputFormat::Table => self.table_listings(listings),
            OutputFormat::Markdown => self.markdown_listings(listings),
            OutputFormat::Csv => self.csv_listings(listings),
        }
    }

    // JSON formatting

    fn json_listings(&self, listings: &[Listing]) -> String {
        serde_json::to_string_pretty(listings).unwrap_or_else(|_| "[]".to_string())
    }

    // Table formatting

    fn table_listings(&self, listings: &[Listing]) -> String {
        let total_width = 9;
        let kg_width = 9;
        let raw_width = 22;
        let title_width = 53;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:>total_width$}  {:>kg_width$}  {:<raw_width$}  {}",
            "€ total", "€/kg", "Unit price", "Title"
        ));
        lines.push(format!(
            "{:-<total_width$}  {:-<kg_width$}  {:-<raw_width$}  {:-<title_width$}",
            "", "", "", ""
        ));

        for listing in listings {
            lines.push(format!(
                "{:>total_width$}  {:>kg_width$}  {:<raw_width$}  {}",
                price_cell(listing.total_price),
                price_cell(listing.unit_price_kg),
                truncate(&listing.unit_price_raw, raw_width),
                listing.title
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} listings", listings.len()));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_listings(&self, listings: &[Listing]) -> String {
        let mut lines = Vec::new();

        lines.push("| € total | €/kg | Unit price | Title |".to_string());
        lines.push("|--------:|-----:|------------|-------|".to_string());

        for listing in listings {
            let title = listing.title.replace('|', "\\|");
            let title = if listing.has_link() {
                format!("[{}]({})", title, listing.link)
            } else {
                title
            };

            lines.push(format!(
                "| {} | {} | {} | {} |",
                price_cell(listing.total_price),
                price_cell(listing.unit_price_kg),
                listing.unit_price_raw.replace('|', "\\|"),
                title
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} listings found*", listings.len()));

        lines.join("\n")
    }

    // CSV formatting

    fn csv_listings(&self, listings: &[Listing]) -> String {
        let mut lines = Vec::new();
        lines.push(CSV_HEADER.to_string());

        for listing in listings {
            lines.push(format!(
                "{},{},{},{},{},{}",
                listing.product_id,
                Self::csv_escape(&listing.title),
                listing.total_price,
                listing.unit_price_kg,
                Self::csv_escape(&listing.unit_price_raw),
                Self::csv_escape(&listing.link)
            ));
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

/// `0.0` means "unknown" for both price fields.
fn price_cell(value: f64) -> String {
    if value > 0.0 {
        format!("{:.2}", value)
    } else {
        "N/A".to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}
