//! Decides, after each harvested page, whether to advance to the next one.
//!
//! The next-page control on a dynamic table is unreliable: it disappears on
//! the last page on some layouts, gets disabled on others, and is routinely
//! obstructed by overlays. A failed ordinary click gets exactly one
//! programmatic retry; a second failure ends the run for this cycle rather
//! than hammering the site.

use tracing::{info, warn};

use crate::models::StopReason;
use crate::scrapers::driver::{politeness_delay, wait_for_load, PageDriver, PageElement};
use crate::scrapers::types::ScrapeOptions;

/// Outcome of one advance attempt.
#[derive(Debug)]
pub enum PageStep {
    /// The next page is loading and becomes the active page.
    Advanced,
    /// Terminal: no further pages will be requested.
    Stopped(StopReason),
}

/// Tracks how many pages have been harvested and enforces the page cap.
/// Once a `Stopped` step is returned the controller must not be asked again.
pub struct PaginationController {
    page_limit: Option<u32>,
    pages_done: u32,
}

impl PaginationController {
    pub fn new(page_limit: Option<u32>) -> Self {
        Self {
            page_limit,
            pages_done: 0,
        }
    }

    pub fn pages_done(&self) -> u32 {
        self.pages_done
    }

    /// Invoked once per page, after its rows are extracted. Check order:
    /// page cap first, then control presence, then its disabled state, then
    /// the click itself.
    pub fn advance(&mut self, driver: &dyn PageDriver, options: &ScrapeOptions) -> PageStep {
        self.pages_done += 1;

        if let Some(limit) = self.page_limit {
            if self.pages_done >= limit {
                info!("Reached page limit ({}). Stopping.", limit);
                return PageStep::Stopped(StopReason::ReachedLimit);
            }
        }

        let control = match driver.find(&options.next_selector) {
            Some(c) => c,
            None => {
                info!("Next control not found on page.");
                return PageStep::Stopped(StopReason::ControlNotFound);
            }
        };

        if is_disabled(control.as_ref()) {
            info!("Next control is disabled: last page.");
            return PageStep::Stopped(StopReason::ControlDisabled);
        }

        if let Err(e) = control.click() {
            warn!("Could not click next control ({}). Trying programmatic click...", e);
            if let Err(e) = control.click_js() {
                warn!("Programmatic click failed too ({}). Stopping.", e);
                return PageStep::Stopped(StopReason::ControlNotFound);
            }
        }
        drop(control);

        wait_for_load(driver, options.load_timeout);
        politeness_delay(options.page_delay.0, options.page_delay.1);
        PageStep::Advanced
    }
}

/// A control counts as disabled when any of its disabled-state attributes
/// says so. Attribute reads that fail are treated as "not disabled" and the
/// click path deals with the fallout.
fn is_disabled(control: &dyn PageElement) -> bool {
    let attr = |name: &str| control.attribute(name).ok().flatten();

    if attr("disabled").is_some() {
        return true;
    }
    if attr("class").is_some_and(|classes| {
        classes.split_whitespace().any(|token| token.contains("disabled"))
    }) {
        return true;
    }
    attr("aria-disabled").is_some_and(|v| v == "true")
}
