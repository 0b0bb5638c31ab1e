//! End-to-end pipeline tests against an in-memory fake page driver.
//!
//! The fake models just enough of a paginated quote table: header labels,
//! body rows of cell text, rows that can go stale mid-read, and a next
//! control that can be absent, disabled, or obstructed.

use std::cell::Cell;

use anyhow::{anyhow, Result};
use market_scout::models::{CellValue, StopReason};
use market_scout::scrapers::driver::{PageDriver, PageElement};
use market_scout::scrapers::{MostActiveScraper, ScrapeOptions};

#[derive(Clone)]
struct NextControl {
    disabled: bool,
    click_intercepted: bool,
}

impl NextControl {
    fn enabled() -> Self {
        Self {
            disabled: false,
            click_intercepted: false,
        }
    }

    fn disabled() -> Self {
        Self {
            disabled: true,
            click_intercepted: false,
        }
    }
}

#[derive(Clone)]
struct FakePage {
    has_table: bool,
    /// Header labels; a `None` label reads as a stale cell.
    headers: Vec<Option<&'static str>>,
    /// Row cell texts; a `None` row reads as stale.
    rows: Vec<Option<Vec<&'static str>>>,
    next: Option<NextControl>,
}

fn live_headers(labels: &[&'static str]) -> Vec<Option<&'static str>> {
    labels.iter().map(|l| Some(*l)).collect()
}

struct FakeDriver {
    pages: Vec<FakePage>,
    current: Cell<usize>,
}

impl FakeDriver {
    fn new(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            current: Cell::new(0),
        }
    }

    fn page(&self) -> &FakePage {
        &self.pages[self.current.get()]
    }
}

impl PageDriver for FakeDriver {
    fn navigate(&self, _url: &str) -> Result<()> {
        Ok(())
    }

    fn is_load_complete(&self) -> Result<bool> {
        Ok(true)
    }

    fn find(&self, selector: &str) -> Option<Box<dyn PageElement + '_>> {
        if selector == "table" {
            if self.page().has_table {
                return Some(Box::new(TextEl("table".to_string())));
            }
            return None;
        }
        if selector.starts_with("button") {
            return self
                .page()
                .next
                .clone()
                .map(|control| Box::new(NextEl { driver: self, control }) as Box<dyn PageElement + '_>);
        }
        None
    }

    fn find_all(&self, selector: &str) -> Vec<Box<dyn PageElement + '_>> {
        let page = self.page();
        if !page.has_table {
            return Vec::new();
        }
        if selector.ends_with("thead th") {
            return page
                .headers
                .iter()
                .map(|h| Box::new(HeaderEl(*h)) as Box<dyn PageElement + '_>)
                .collect();
        }
        if selector.ends_with("tbody tr") {
            return page
                .rows
                .iter()
                .map(|row| Box::new(RowEl { cells: row.clone() }) as Box<dyn PageElement + '_>)
                .collect();
        }
        Vec::new()
    }
}

struct TextEl(String);

impl PageElement for TextEl {
    fn text(&self) -> Result<String> {
        Ok(self.0.clone())
    }
    fn attribute(&self, _name: &str) -> Result<Option<String>> {
        Ok(None)
    }
    fn click(&self) -> Result<()> {
        Ok(())
    }
    fn click_js(&self) -> Result<()> {
        Ok(())
    }
    fn find_all(&self, _selector: &str) -> Result<Vec<Box<dyn PageElement + '_>>> {
        Ok(Vec::new())
    }
}

struct HeaderEl(Option<&'static str>);

impl PageElement for HeaderEl {
    fn text(&self) -> Result<String> {
        match self.0 {
            Some(label) => Ok(label.to_string()),
            None => Err(anyhow!("stale element reference")),
        }
    }
    fn attribute(&self, _name: &str) -> Result<Option<String>> {
        Ok(None)
    }
    fn click(&self) -> Result<()> {
        Ok(())
    }
    fn click_js(&self) -> Result<()> {
        Ok(())
    }
    fn find_all(&self, _selector: &str) -> Result<Vec<Box<dyn PageElement + '_>>> {
        Ok(Vec::new())
    }
}

struct RowEl {
    cells: Option<Vec<&'static str>>,
}

impl PageElement for RowEl {
    fn text(&self) -> Result<String> {
        Ok(String::new())
    }
    fn attribute(&self, _name: &str) -> Result<Option<String>> {
        Ok(None)
    }
    fn click(&self) -> Result<()> {
        Ok(())
    }
    fn click_js(&self) -> Result<()> {
        Ok(())
    }
    fn find_all(&self, _selector: &str) -> Result<Vec<Box<dyn PageElement + '_>>> {
        match &self.cells {
            Some(cells) => Ok(cells
                .iter()
                .map(|c| Box::new(TextEl(c.to_string())) as Box<dyn PageElement + '_>)
                .collect()),
            None => Err(anyhow!("stale element reference")),
        }
    }
}

struct NextEl<'a> {
    driver: &'a FakeDriver,
    control: NextControl,
}

impl PageElement for NextEl<'_> {
    fn text(&self) -> Result<String> {
        Ok("Next".to_string())
    }
    fn attribute(&self, name: &str) -> Result<Option<String>> {
        if name == "disabled" && self.control.disabled {
            return Ok(Some(String::new()));
        }
        Ok(None)
    }
    fn click(&self) -> Result<()> {
        if self.control.click_intercepted {
            return Err(anyhow!("click intercepted by overlay"));
        }
        self.driver.current.set(self.driver.current.get() + 1);
        Ok(())
    }
    fn click_js(&self) -> Result<()> {
        self.driver.current.set(self.driver.current.get() + 1);
        Ok(())
    }
    fn find_all(&self, _selector: &str) -> Result<Vec<Box<dyn PageElement + '_>>> {
        Ok(Vec::new())
    }
}

const HEADERS: [&str; 7] = [
    "Symbol",
    "Name",
    "Price (Intraday)",
    "Change",
    "Volume",
    "Market Cap",
    "PE Ratio (TTM)",
];

fn two_page_fixture() -> Vec<FakePage> {
    vec![
        FakePage {
            has_table: true,
            headers: live_headers(&HEADERS),
            rows: vec![
                Some(vec!["AAPL", "Apple Inc.", "189.12", "+1.23 (+0.25%)", "52.3M", "2.95T", "31.2"]),
                Some(vec!["TSLA", "Tesla, Inc.", "248.50", "-3.10 (-1.23%)", "118M", "790B", "\u{2014}"]),
                Some(vec!["AMD", "Advanced Micro Devices", "102.40", "+0.80 (+0.79%)", "64.1M", "165B", "N/A"]),
            ],
            next: Some(NextControl::enabled()),
        },
        FakePage {
            has_table: true,
            headers: live_headers(&HEADERS),
            rows: vec![
                Some(vec!["F", "Ford Motor Company", "12.05", "+0.05 (+0.42%)", "41M", "48B", "7.9"]),
                Some(vec!["PLTR", "Palantir Technologies", "16.80", "-0.20 (-1.18%)", "38.2M", "36B", "-"]),
            ],
            next: Some(NextControl::disabled()),
        },
    ]
}

fn scraper(pages: Vec<FakePage>) -> MostActiveScraper<FakeDriver> {
    MostActiveScraper::new(FakeDriver::new(pages), ScrapeOptions::without_delays())
}

fn scraper_with_limit(pages: Vec<FakePage>, limit: u32) -> MostActiveScraper<FakeDriver> {
    let options = ScrapeOptions {
        page_limit: Some(limit),
        ..ScrapeOptions::without_delays()
    };
    MostActiveScraper::new(FakeDriver::new(pages), options)
}

#[test]
fn scrapes_all_pages_in_order_until_control_disabled() {
    let outcome = scraper(two_page_fixture()).run().unwrap();

    assert_eq!(outcome.stop_reason, StopReason::ControlDisabled);
    assert_eq!(outcome.pages, 2);

    let symbols: Vec<&str> = outcome.records.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(symbols, ["AAPL", "TSLA", "AMD", "F", "PLTR"]);

    let aapl = &outcome.records[0];
    assert_eq!(aapl.name, "Apple Inc.");
    assert_eq!(aapl.price_raw.as_deref(), Some("189.12"));
    assert_eq!(aapl.price, CellValue::Number(189.12));
    assert_eq!(aapl.change, CellValue::Number(1.23));
    assert_eq!(aapl.volume, CellValue::Number(52_300_000.0));
    assert_eq!(aapl.market_cap, CellValue::Number(2_950_000_000_000.0));
    assert_eq!(aapl.pe_ratio, CellValue::Number(31.2));

    let tsla = &outcome.records[1];
    assert_eq!(tsla.change, CellValue::Number(-3.10));
    assert_eq!(tsla.pe_ratio, CellValue::Unavailable);

    let pltr = &outcome.records[4];
    assert_eq!(pltr.pe_ratio, CellValue::Unavailable);
    assert_eq!(pltr.pe_raw.as_deref(), Some("-"));
}

#[test]
fn page_limit_stops_before_pagination() {
    let outcome = scraper_with_limit(two_page_fixture(), 1).run().unwrap();

    assert_eq!(outcome.stop_reason, StopReason::ReachedLimit);
    assert_eq!(outcome.pages, 1);
    assert_eq!(outcome.records.len(), 3);
}

#[test]
fn stale_row_is_skipped_without_aborting_the_page() {
    let mut pages = two_page_fixture();
    pages[0].rows[1] = None;
    pages[0].next = None;
    pages.truncate(1);

    let outcome = scraper(pages).run().unwrap();

    assert_eq!(outcome.stop_reason, StopReason::ControlNotFound);
    let symbols: Vec<&str> = outcome.records.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(symbols, ["AAPL", "AMD"]);
}

#[test]
fn missing_control_stops_with_control_not_found() {
    let mut pages = two_page_fixture();
    pages[1].next = None;

    let outcome = scraper(pages).run().unwrap();
    assert_eq!(outcome.stop_reason, StopReason::ControlNotFound);
    assert_eq!(outcome.records.len(), 5);
}

#[test]
fn obstructed_click_falls_back_to_programmatic_activation() {
    let mut pages = two_page_fixture();
    pages[0].next = Some(NextControl {
        disabled: false,
        click_intercepted: true,
    });

    let outcome = scraper(pages).run().unwrap();
    assert_eq!(outcome.stop_reason, StopReason::ControlDisabled);
    assert_eq!(outcome.records.len(), 5);
}

#[test]
fn reordered_headers_still_map_columns_per_page() {
    let pages = vec![
        FakePage {
            has_table: true,
            headers: live_headers(&["Symbol", "Name", "Price", "Change"]),
            rows: vec![Some(vec!["AAPL", "Apple Inc.", "189.12", "+1.23"])],
            next: Some(NextControl::enabled()),
        },
        // Same table, columns shuffled between renders.
        FakePage {
            has_table: true,
            headers: live_headers(&["Name", "Symbol", "Change", "Price"]),
            rows: vec![Some(vec!["Tesla, Inc.", "TSLA", "-3.10", "248.50"])],
            next: Some(NextControl::disabled()),
        },
    ];

    let outcome = scraper(pages).run().unwrap();

    assert_eq!(outcome.records[0].symbol, "AAPL");
    assert_eq!(outcome.records[0].price, CellValue::Number(189.12));
    assert_eq!(outcome.records[1].symbol, "TSLA");
    assert_eq!(outcome.records[1].price, CellValue::Number(248.50));
    assert_eq!(outcome.records[1].change, CellValue::Number(-3.10));
    // Volume was never a column here, so it must be absent, not guessed.
    assert_eq!(outcome.records[0].volume_raw, None);
    assert_eq!(outcome.records[0].volume, CellValue::Unavailable);
}

#[test]
fn stale_header_cell_keeps_later_columns_aligned() {
    // One header read fails mid-page; its position must be kept as an
    // unmatched label so the columns to its right do not shift left.
    let pages = vec![FakePage {
        has_table: true,
        headers: vec![Some("Symbol"), None, Some("Price"), Some("Volume")],
        rows: vec![Some(vec!["AAPL", "Apple Inc.", "189.12", "52.3M"])],
        next: None,
    }];

    let outcome = scraper(pages).run().unwrap();
    let record = &outcome.records[0];

    assert_eq!(record.symbol, "AAPL");
    // Name keyword can't match the unreadable label; position 1 fallback
    // still lands on the right cell.
    assert_eq!(record.name, "Apple Inc.");
    assert_eq!(record.price_raw.as_deref(), Some("189.12"));
    assert_eq!(record.price, CellValue::Number(189.12));
    assert_eq!(record.volume_raw.as_deref(), Some("52.3M"));
    assert_eq!(record.volume, CellValue::Number(52_300_000.0));
}

#[test]
fn missing_table_on_first_page_fails_the_run() {
    let pages = vec![FakePage {
        has_table: false,
        headers: Vec::new(),
        rows: Vec::new(),
        next: None,
    }];

    let result = scraper(pages).run();
    assert!(result.is_err());
}

#[test]
fn missing_table_on_a_later_page_keeps_collected_records() {
    let mut pages = two_page_fixture();
    pages[1] = FakePage {
        has_table: false,
        headers: Vec::new(),
        rows: Vec::new(),
        next: None,
    };

    let outcome = scraper(pages).run().unwrap();
    assert_eq!(outcome.stop_reason, StopReason::ExtractionError);
    assert_eq!(outcome.records.len(), 3);
}

#[test]
fn empty_table_is_not_an_error() {
    let pages = vec![FakePage {
        has_table: true,
        headers: live_headers(&HEADERS),
        rows: Vec::new(),
        next: None,
    }];

    let outcome = scraper(pages).run().unwrap();
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.stop_reason, StopReason::ControlNotFound);
}

#[test]
fn duplicate_symbols_across_pages_are_preserved() {
    let mut pages = two_page_fixture();
    pages[1].rows = vec![Some(vec![
        "AAPL",
        "Apple Inc.",
        "189.20",
        "+1.31",
        "52.4M",
        "2.95T",
        "31.2",
    ])];

    let outcome = scraper(pages).run().unwrap();
    let apples = outcome
        .records
        .iter()
        .filter(|r| r.symbol == "AAPL")
        .count();
    assert_eq!(apples, 2);
}
