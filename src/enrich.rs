//! Optional per-symbol enrichment from a quote-history endpoint.
//!
//! Runs as its own serial loop after scraping, keyed by the record's symbol.
//! Lookups are memoized for the duration of one run and rate-limited by a
//! caller-supplied delay. A failed lookup degrades to unavailable fields,
//! it never aborts the run.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::models::{CellValue, Record};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Keys attached to [`Record::enrichment`]. Disjoint from the derived field
/// names so enrichment can never overwrite a scraped value.
const FIELD_PERIOD_HIGH: &str = "period_high";
const FIELD_PERIOD_LOW: &str = "period_low";
const FIELD_PERIOD_AVG_CLOSE: &str = "period_avg_close";
const FIELD_PERIOD_AVG_VOLUME: &str = "period_avg_volume";

#[derive(Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Deserialize)]
struct ChartResult {
    indicators: Indicators,
}

#[derive(Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Deserialize, Default)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
}

/// Client for the quote-history endpoint.
pub struct EnrichmentClient {
    client: reqwest::Client,
    base_url: String,
}

impl EnrichmentClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url("https://query1.finance.yahoo.com")
    }

    /// Custom base URL, for testing against a mock server.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch period summary stats for one symbol. An unknown symbol (HTTP
    /// 404) or an empty history yields a map of unavailable values; only
    /// transport-level failures surface as errors.
    pub async fn fetch(
        &self,
        symbol: &str,
        range: &str,
        interval: &str,
    ) -> Result<BTreeMap<String, CellValue>> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let response = self
            .client
            .get(&url)
            .query(&[("range", range), ("interval", interval)])
            .send()
            .await
            .with_context(|| format!("enrichment request for {} failed", symbol))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!("{}: no history available (404)", symbol);
            return Ok(unavailable_fields());
        }
        if !response.status().is_success() {
            anyhow::bail!(
                "enrichment request for {} returned HTTP {}",
                symbol,
                response.status()
            );
        }

        let body: ChartResponse = response
            .json()
            .await
            .with_context(|| format!("enrichment response for {} was not valid JSON", symbol))?;

        let quote = body
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .and_then(|r| r.indicators.quote.into_iter().next())
            .unwrap_or_default();

        Ok(summarize(&quote))
    }
}

fn unavailable_fields() -> BTreeMap<String, CellValue> {
    [
        FIELD_PERIOD_HIGH,
        FIELD_PERIOD_LOW,
        FIELD_PERIOD_AVG_CLOSE,
        FIELD_PERIOD_AVG_VOLUME,
    ]
    .into_iter()
    .map(|k| (k.to_string(), CellValue::Unavailable))
    .collect()
}

fn summarize(quote: &Quote) -> BTreeMap<String, CellValue> {
    let highs: Vec<f64> = quote.high.iter().flatten().copied().collect();
    let lows: Vec<f64> = quote.low.iter().flatten().copied().collect();
    let closes: Vec<f64> = quote.close.iter().flatten().copied().collect();
    let volumes: Vec<f64> = quote.volume.iter().flatten().copied().collect();

    let max = |v: &[f64]| v.iter().copied().fold(None, |acc: Option<f64>, x| {
        Some(acc.map_or(x, |a| a.max(x)))
    });
    let min = |v: &[f64]| v.iter().copied().fold(None, |acc: Option<f64>, x| {
        Some(acc.map_or(x, |a| a.min(x)))
    });
    let avg = |v: &[f64]| {
        if v.is_empty() {
            None
        } else {
            Some(v.iter().sum::<f64>() / v.len() as f64)
        }
    };

    let mut fields = BTreeMap::new();
    fields.insert(FIELD_PERIOD_HIGH.to_string(), max(&highs).into());
    fields.insert(FIELD_PERIOD_LOW.to_string(), min(&lows).into());
    fields.insert(FIELD_PERIOD_AVG_CLOSE.to_string(), avg(&closes).into());
    fields.insert(FIELD_PERIOD_AVG_VOLUME.to_string(), avg(&volumes).into());
    fields
}

/// Drives the enrichment pass over a finalized record set.
pub struct Enricher {
    client: EnrichmentClient,
    /// Pause between lookups that actually hit the network.
    pub delay: Duration,
    pub range: String,
    pub interval: String,
}

impl Enricher {
    pub fn new(client: EnrichmentClient, delay: Duration, range: &str, interval: &str) -> Self {
        Self {
            client,
            delay,
            range: range.to_string(),
            interval: interval.to_string(),
        }
    }

    /// Attach enrichment fields to every record. Each distinct symbol is
    /// looked up once per run; the memo table lives and dies with this call.
    pub async fn enrich(&self, records: &mut [Record]) {
        let mut memo: HashMap<String, BTreeMap<String, CellValue>> = HashMap::new();
        let mut fetched = 0usize;

        for record in records.iter_mut() {
            if record.symbol.is_empty() {
                continue;
            }
            if !memo.contains_key(&record.symbol) {
                if fetched > 0 && !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                let fields = match self
                    .client
                    .fetch(&record.symbol, &self.range, &self.interval)
                    .await
                {
                    Ok(fields) => fields,
                    Err(e) => {
                        warn!("enrichment lookup for {} failed: {:#}", record.symbol, e);
                        unavailable_fields()
                    }
                };
                fetched += 1;
                memo.insert(record.symbol.clone(), fields);
            }
            let fields = &memo[&record.symbol];
            for (key, value) in fields {
                // Attach, never overwrite.
                record.enrichment.entry(key.clone()).or_insert(*value);
            }
        }

        info!(
            "Enrichment pass complete: {} lookup(s) for {} record(s)",
            fetched,
            records.len()
        );
    }
}
