use std::time::Duration;

/// Everything the orchestrator needs to drive one run: entry point,
/// selectors, timeouts and politeness delays. Passed in explicitly at
/// construction, never read from process-wide state.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Page to open first.
    pub entry_url: String,
    /// Stop after this many pages (None = scrape until the site runs out).
    pub page_limit: Option<u32>,

    /// Selector whose absence means the page layout is broken.
    pub table_selector: String,
    /// Selector for the header label cells.
    pub header_selector: String,
    /// Selector for the body rows.
    pub row_selector: String,
    /// Selector for cells, scoped under a row.
    pub cell_selector: String,
    /// Selector for the next-page control.
    pub next_selector: String,

    /// Upper bound on waiting for a page to report itself loaded.
    pub load_timeout: Duration,
    /// Politeness delay bounds after the initial navigation.
    pub settle_delay: (Duration, Duration),
    /// Politeness delay bounds after each pagination advance.
    pub page_delay: (Duration, Duration),
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            entry_url: "https://finance.yahoo.com/most-active".to_string(),
            page_limit: None,
            table_selector: "table".to_string(),
            header_selector: "table thead th".to_string(),
            row_selector: "table tbody tr".to_string(),
            cell_selector: "td".to_string(),
            next_selector: r#"button[aria-label*="Next"]"#.to_string(),
            load_timeout: Duration::from_secs(10),
            settle_delay: (Duration::from_millis(500), Duration::from_millis(1000)),
            page_delay: (Duration::from_millis(500), Duration::from_millis(1200)),
        }
    }
}

impl ScrapeOptions {
    /// Options with all waiting reduced to zero, for test doubles where no
    /// real page needs settling.
    pub fn without_delays() -> Self {
        Self {
            load_timeout: Duration::ZERO,
            settle_delay: (Duration::ZERO, Duration::ZERO),
            page_delay: (Duration::ZERO, Duration::ZERO),
            ..Self::default()
        }
    }
}
