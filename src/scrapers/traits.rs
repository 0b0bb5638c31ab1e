use crate::models::ScrapeOutcome;
use anyhow::Result;
use async_trait::async_trait;

/// Common trait for table scrapers, so new listing sources can slot in
/// behind the same interface.
#[async_trait]
pub trait TableScraper: Send + Sync {
    /// Run a full scrape from the source's entry point.
    async fn scrape(&self) -> Result<ScrapeOutcome>;

    /// Name of the source, for logs and output naming.
    fn source_name(&self) -> &'static str;
}

#[async_trait]
impl<D> TableScraper for crate::scrapers::MostActiveScraper<D>
where
    D: crate::scrapers::driver::PageDriver + Send + Sync,
{
    async fn scrape(&self) -> Result<ScrapeOutcome> {
        self.run()
    }

    fn source_name(&self) -> &'static str {
        "most-active"
    }
}
