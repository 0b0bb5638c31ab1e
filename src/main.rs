use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use market_scout::enrich::{EnrichmentClient, Enricher};
use market_scout::scrapers::{ChromeDriver, MostActiveScraper, ScrapeOptions, TableScraper};
use market_scout::sink;

/// Scrape a paginated "most active" stocks table into CSV + raw JSON.
#[derive(Parser)]
#[command(name = "market-scout")]
struct Cli {
    /// Run the browser in headless mode
    #[arg(long)]
    headless: bool,

    /// Max pages to scrape (default: all)
    #[arg(long)]
    pages: Option<u32>,

    /// Entry URL to scrape
    #[arg(long, default_value = "https://finance.yahoo.com/most-active")]
    url: String,

    /// Output filename base (no extension)
    #[arg(long, default_value = "most_active")]
    out: String,

    /// Attach per-symbol history enrichment after scraping
    #[arg(long)]
    enrich: bool,

    /// Delay between enrichment lookups, in milliseconds
    #[arg(long, default_value_t = 500)]
    enrich_delay_ms: u64,

    /// Enrichment history range (e.g. 5d, 1mo, 3mo)
    #[arg(long, default_value = "1mo")]
    range: String,

    /// Enrichment history interval (e.g. 1d, 1wk)
    #[arg(long, default_value = "1d")]
    interval: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("market_scout=info".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let options = ScrapeOptions {
        entry_url: cli.url,
        page_limit: cli.pages,
        ..ScrapeOptions::default()
    };

    let driver = ChromeDriver::launch(cli.headless)?;
    let scraper = MostActiveScraper::new(driver, options);

    info!("Starting {} scrape...", scraper.source_name());
    let mut outcome = scraper.scrape().await?;
    info!(
        "Collected {} records over {} page(s) (stop reason: {})",
        outcome.records.len(),
        outcome.pages,
        outcome.stop_reason
    );

    if cli.enrich {
        if outcome.records.is_empty() {
            warn!("Nothing to enrich.");
        } else {
            let enricher = Enricher::new(
                EnrichmentClient::new()?,
                Duration::from_millis(cli.enrich_delay_ms),
                &cli.range,
                &cli.interval,
            );
            enricher.enrich(&mut outcome.records).await;
        }
    }

    let written = sink::write_outputs(&outcome.records, &cli.out)?;
    for path in &written {
        info!("Wrote {}", path.display());
    }

    Ok(())
}
