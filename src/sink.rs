//! Writes a finished record set to timestamped CSV and raw-JSON files.
//!
//! Column order is fixed here, not upstream: identity and name first, then
//! raw/derived pairs per metric, enrichment fields last.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{info, warn};

use crate::models::Record;

const BASE_COLUMNS: [&str; 13] = [
    "scraped_at",
    "symbol",
    "name",
    "price_raw",
    "price",
    "change_raw",
    "change",
    "volume_raw",
    "volume",
    "market_cap_raw",
    "market_cap",
    "pe_raw",
    "pe_ratio",
];

/// Write `{base}_{YYYYMMDD_HHMMSS}.csv` and `{base}_{YYYYMMDD_HHMMSS}_raw.json`.
/// Returns the paths written; an empty record set writes nothing.
pub fn write_outputs(records: &[Record], base: &str) -> Result<Vec<PathBuf>> {
    if records.is_empty() {
        warn!("No data to save.");
        return Ok(Vec::new());
    }

    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let csv_path = PathBuf::from(format!("{}_{}.csv", base, stamp));
    let json_path = PathBuf::from(format!("{}_{}_raw.json", base, stamp));

    write_csv(records, &csv_path)?;
    info!("Saved CSV  -> {}", csv_path.display());

    let json = serde_json::to_string_pretty(records).context("Failed to serialize records")?;
    std::fs::write(&json_path, json)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;
    info!("Saved JSON -> {}", json_path.display());

    Ok(vec![csv_path, json_path])
}

fn write_csv(records: &[Record], path: &PathBuf) -> Result<()> {
    // Enrichment keys vary per run; take the sorted union across records.
    let enrichment_columns: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.enrichment.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let header: Vec<&str> = BASE_COLUMNS
        .iter()
        .copied()
        .chain(enrichment_columns.iter().copied())
        .collect();
    writer.write_record(&header)?;

    for r in records {
        let raw = |v: &Option<String>| v.clone().unwrap_or_default();
        let mut row = vec![
            r.scraped_at.to_rfc3339(),
            r.symbol.clone(),
            r.name.clone(),
            raw(&r.price_raw),
            r.price.to_string(),
            raw(&r.change_raw),
            r.change.to_string(),
            raw(&r.volume_raw),
            r.volume.to_string(),
            raw(&r.market_cap_raw),
            r.market_cap.to_string(),
            raw(&r.pe_raw),
            r.pe_ratio.to_string(),
        ];
        for col in &enrichment_columns {
            row.push(
                r.enrichment
                    .get(*col)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        writer.write_record(&row)?;
    }

    writer.flush().context("Failed to flush CSV")?;
    Ok(())
}
