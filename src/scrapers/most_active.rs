//! Orchestrates the paginated table scrape: per page, resolve the header
//! layout, extract rows, then ask the pagination controller whether to go on.

use anyhow::{bail, Result};
use tracing::{error, info};

use crate::models::{ScrapeOutcome, StopReason};
use crate::scrapers::driver::{politeness_delay, wait_for_load, PageDriver};
use crate::scrapers::headers::HeaderIndex;
use crate::scrapers::pagination::{PageStep, PaginationController};
use crate::scrapers::rows::extract_rows;
use crate::scrapers::types::ScrapeOptions;

/// Scraper for a paginated "most active" style quote table. Holds its own
/// driver and configuration; no shared state with any other run.
pub struct MostActiveScraper<D: PageDriver> {
    driver: D,
    options: ScrapeOptions,
}

impl<D: PageDriver> MostActiveScraper<D> {
    pub fn new(driver: D, options: ScrapeOptions) -> Self {
        Self { driver, options }
    }

    pub fn options(&self) -> &ScrapeOptions {
        &self.options
    }

    /// Scrape starting from the configured entry URL.
    pub fn run(&self) -> Result<ScrapeOutcome> {
        self.run_from(&self.options.entry_url)
    }

    /// Scrape starting from `url`, accumulating records across pages until
    /// the pagination controller stops.
    ///
    /// A page with no table at all fails the run when it is the first page
    /// (the layout is broken, not empty); on a later page it ends the run
    /// with an `extraction-error` stop reason so the pages already collected
    /// are not lost.
    pub fn run_from(&self, url: &str) -> Result<ScrapeOutcome> {
        info!("Opening URL: {}", url);
        self.driver.navigate(url)?;
        wait_for_load(&self.driver, self.options.load_timeout);
        politeness_delay(self.options.settle_delay.0, self.options.settle_delay.1);

        let mut records = Vec::new();
        let mut pager = PaginationController::new(self.options.page_limit);

        loop {
            let page_no = pager.pages_done() + 1;
            info!("Scraping page {} ...", page_no);

            if self.driver.find(&self.options.table_selector).is_none() {
                if page_no == 1 {
                    bail!("no table found on the page");
                }
                error!("Table disappeared on page {}; keeping {} collected records.", page_no, records.len());
                return Ok(ScrapeOutcome {
                    records,
                    stop_reason: StopReason::ExtractionError,
                    pages: pager.pages_done(),
                });
            }

            // Headers are re-read per page: dynamic tables reorder columns
            // between renders. A header cell that goes stale mid-read keeps
            // its position as an empty (unmatched) label; dropping it would
            // shift every later column left and misattribute fields.
            let labels: Vec<String> = self
                .driver
                .find_all(&self.options.header_selector)
                .iter()
                .map(|h| h.text().map(|t| t.trim().to_string()).unwrap_or_default())
                .collect();
            let index = HeaderIndex::resolve(&labels);

            let row_handles = self.driver.find_all(&self.options.row_selector);
            let page_records = extract_rows(&row_handles, &index, &self.options.cell_selector);
            drop(row_handles);
            info!("Found {} rows on page {}", page_records.len(), page_no);
            records.extend(page_records);

            match pager.advance(&self.driver, &self.options) {
                PageStep::Advanced => continue,
                PageStep::Stopped(stop_reason) => {
                    info!(
                        "Scraping completed: {} records over {} page(s), stop reason: {}",
                        records.len(),
                        pager.pages_done(),
                        stop_reason
                    );
                    return Ok(ScrapeOutcome {
                        records,
                        stop_reason,
                        pages: pager.pages_done(),
                    });
                }
            }
        }
    }
}
