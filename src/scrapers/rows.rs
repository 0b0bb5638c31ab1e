//! Turns the currently visible table body into [`Record`]s.

use anyhow::Result;
use chrono::Utc;
use tracing::debug;

use crate::models::{CellValue, Record};
use crate::normalize;
use crate::scrapers::driver::PageElement;
use crate::scrapers::headers::{HeaderIndex, SemanticField};

/// Which normalizer handles which column. Kept as an explicit table so a
/// field's cleanup rule is always looked up by name, never by dynamic
/// attribute games.
fn normalizer_for(field: SemanticField) -> fn(&str) -> CellValue {
    match field {
        SemanticField::Price => normalize::price,
        SemanticField::Change => normalize::delta,
        SemanticField::Volume => normalize::magnitude,
        SemanticField::MarketCap => normalize::magnitude,
        SemanticField::PeRatio => normalize::ratio,
        // Identity columns are never normalized.
        SemanticField::Symbol | SemanticField::Name => |_| CellValue::Unavailable,
    }
}

/// Extract one record per row, in row order. A row whose handle went stale
/// mid-read (the page re-rendered underneath us) contributes nothing and
/// does not stop the rest of the page. An empty result is a valid outcome.
pub fn extract_rows(
    rows: &[Box<dyn PageElement + '_>],
    index: &HeaderIndex,
    cell_selector: &str,
) -> Vec<Record> {
    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        match extract_row(row.as_ref(), index, cell_selector) {
            Ok(record) => records.push(record),
            Err(e) => debug!("skipping stale row {}: {}", i, e),
        }
    }
    records
}

fn extract_row(
    row: &dyn PageElement,
    index: &HeaderIndex,
    cell_selector: &str,
) -> Result<Record> {
    let cells = row.find_all(cell_selector)?;

    let cell_text = |idx: usize| -> Result<Option<String>> {
        match cells.get(idx) {
            Some(cell) => Ok(Some(cell.text()?.trim().to_string())),
            None => Ok(None),
        }
    };
    let resolved = |idx: Option<usize>| -> Result<Option<String>> {
        match idx {
            Some(i) => cell_text(i),
            None => Ok(None),
        }
    };

    let symbol = cell_text(index.symbol)?.unwrap_or_default();
    let name = cell_text(index.name)?.unwrap_or_default();
    let price_raw = resolved(index.price)?;
    let change_raw = resolved(index.change)?;
    let volume_raw = resolved(index.volume)?;
    let market_cap_raw = resolved(index.market_cap)?;
    let pe_raw = resolved(index.pe_ratio)?;

    let derive = |raw: &Option<String>, field: SemanticField| -> CellValue {
        match raw {
            Some(text) => normalizer_for(field)(text),
            None => CellValue::Unavailable,
        }
    };

    Ok(Record {
        price: derive(&price_raw, SemanticField::Price),
        change: derive(&change_raw, SemanticField::Change),
        volume: derive(&volume_raw, SemanticField::Volume),
        market_cap: derive(&market_cap_raw, SemanticField::MarketCap),
        pe_ratio: derive(&pe_raw, SemanticField::PeRatio),
        symbol,
        name,
        price_raw,
        change_raw,
        volume_raw,
        market_cap_raw,
        pe_raw,
        scraped_at: Utc::now(),
        enrichment: Default::default(),
    })
}
