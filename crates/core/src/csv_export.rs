//! CSV export for estimate line items
//!
//! Writes the estimate in a form spreadsheets and estimating tools can import.

use std::io::Write;

use crate::line_item::LineItem;

/// Error types for CSV export
#[derive(Debug, thiserror::Error)]
pub enum CsvExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),
}

pub type CsvExportResult<T> = Result<T, CsvExportError>;

/// Column headers, in output order
pub const LINE_ITEM_HEADERS: [&str; 9] = [
    "ID",
    "Page",
    "Description",
    "Category",
    "Quantity",
    "Unit",
    "Unit Cost",
    "Total Cost",
    "Notes",
];

/// Configuration for CSV export
#[derive(Debug, Clone)]
pub struct CsvExportConfig {
    /// Include column headers in the output
    pub include_headers: bool,

    /// CSV delimiter character
    pub delimiter: u8,

    /// Export only items from specific pages (None = all pages)
    pub page_filter: Option<Vec<u32>>,
}

impl Default for CsvExportConfig {
    fn default() -> Self {
        Self { include_headers: true, delimiter: b',', page_filter: None }
    }
}

/// Export line items to CSV
///
/// Rows keep the order of `items`. Quantities and costs are written with
/// their shortest round-trip representation.
pub fn export_line_items_csv<W: Write>(
    writer: W,
    items: &[LineItem],
    config: &CsvExportConfig,
) -> CsvExportResult<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(false)
        .from_writer(writer);

    if config.include_headers {
        csv_writer.write_record(LINE_ITEM_HEADERS)?;
    }

    let selected = items.iter().filter(|item| match &config.page_filter {
        Some(pages) => pages.contains(&item.page),
        None => true,
    });

    for item in selected {
        csv_writer.write_record(&[
            item.id.to_string(),
            item.page.to_string(),
            item.description.clone(),
            item.category.clone(),
            item.quantity.to_string(),
            item.unit.clone(),
            item.unit_cost.to_string(),
            item.total_cost.to_string(),
            item.notes.clone(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
