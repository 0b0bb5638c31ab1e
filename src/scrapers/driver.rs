//! Thin seam over the browser-automation capability.
//!
//! The scrape pipeline only ever talks to [`PageDriver`] and [`PageElement`],
//! so tests can run it against an in-memory fake page. The real
//! implementation wraps a headless Chrome tab.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use headless_chrome::browser::tab::element::Element;
use headless_chrome::{Browser, LaunchOptions, Tab};
use rand::Rng;
use tracing::{info, warn};

/// A handle to one DOM element. Reads can fail at any time when the page
/// re-renders underneath us (a stale handle); callers treat that as a
/// skippable condition, not a fatal one.
pub trait PageElement {
    /// Inner text of the element. Errors when the handle has gone stale.
    fn text(&self) -> Result<String>;

    /// Attribute value, `None` when the attribute is absent.
    fn attribute(&self, name: &str) -> Result<Option<String>>;

    /// Normal interactive click.
    fn click(&self) -> Result<()>;

    /// Programmatic activation bypassing normal interaction, for when the
    /// element is obstructed.
    fn click_js(&self) -> Result<()>;

    /// Elements matching `selector` scoped under this element.
    fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn PageElement + '_>>>;
}

/// One browser tab. A single serial command stream: every call blocks.
pub trait PageDriver {
    fn navigate(&self, url: &str) -> Result<()>;

    /// Whether the document has reached its loaded/stable state. Polled by
    /// [`wait_for_load`].
    fn is_load_complete(&self) -> Result<bool>;

    /// First element matching `selector`, or `None` when absent. Absence is
    /// an ordinary outcome here, never an error.
    fn find(&self, selector: &str) -> Option<Box<dyn PageElement + '_>>;

    fn find_all(&self, selector: &str) -> Vec<Box<dyn PageElement + '_>>;
}

/// Poll until the page reports itself loaded, bounded by `timeout`.
/// Returns false on timeout; the caller proceeds optimistically, a slow
/// readyState is not worth aborting a run over.
pub fn wait_for_load(driver: &dyn PageDriver, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if driver.is_load_complete().unwrap_or(false) {
            return true;
        }
        if Instant::now() >= deadline {
            warn!("page did not reach a loaded state within {:?}", timeout);
            return false;
        }
        thread::sleep(Duration::from_millis(100));
    }
}

/// Sleep for a random duration in `[min, max]`. Zero bounds skip the sleep
/// entirely so test doubles run at full speed.
pub fn politeness_delay(min: Duration, max: Duration) {
    if max.is_zero() {
        return;
    }
    let span = max.saturating_sub(min);
    let jitter = if span.is_zero() {
        Duration::ZERO
    } else {
        Duration::from_millis(rand::thread_rng().gen_range(0..=span.as_millis() as u64))
    };
    thread::sleep(min + jitter);
}

/// Headless Chrome implementation of the driver seam.
pub struct ChromeDriver {
    // Kept alive for the lifetime of the tab.
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeDriver {
    /// Launch a Chrome instance and open a single tab.
    pub fn launch(headless: bool) -> Result<Self> {
        info!("Launching Chrome (headless: {})...", headless);

        let options = LaunchOptions::default_builder()
            .headless(headless)
            .window_size(Some((1280, 1024)))
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open tab")?;

        Ok(Self {
            _browser: browser,
            tab,
        })
    }
}

impl PageDriver for ChromeDriver {
    fn navigate(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .with_context(|| format!("Failed to navigate to {}", url))?;
        self.tab
            .wait_until_navigated()
            .context("Navigation did not settle")?;
        Ok(())
    }

    fn is_load_complete(&self) -> Result<bool> {
        let result = self
            .tab
            .evaluate("document.readyState", false)
            .context("readyState probe failed")?;
        Ok(result
            .value
            .and_then(|v| v.as_str().map(|s| s == "complete"))
            .unwrap_or(false))
    }

    fn find(&self, selector: &str) -> Option<Box<dyn PageElement + '_>> {
        match self.tab.find_element(selector) {
            Ok(el) => Some(Box::new(ChromeElement { el })),
            Err(_) => None,
        }
    }

    fn find_all(&self, selector: &str) -> Vec<Box<dyn PageElement + '_>> {
        match self.tab.find_elements(selector) {
            Ok(els) => els
                .into_iter()
                .map(|el| Box::new(ChromeElement { el }) as Box<dyn PageElement + '_>)
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

struct ChromeElement<'a> {
    el: Element<'a>,
}

impl<'a> PageElement for ChromeElement<'a> {
    fn text(&self) -> Result<String> {
        self.el.get_inner_text().context("element text read failed")
    }

    fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.el
            .get_attribute_value(name)
            .context("element attribute read failed")
    }

    fn click(&self) -> Result<()> {
        self.el.click().context("element click failed")?;
        Ok(())
    }

    fn click_js(&self) -> Result<()> {
        self.el
            .call_js_fn("function() { this.click(); }", vec![], false)
            .context("programmatic click failed")?;
        Ok(())
    }

    fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn PageElement + '_>>> {
        let els = self
            .el
            .find_elements(selector)
            .context("scoped element query failed")?;
        Ok(els
            .into_iter()
            .map(|el| Box::new(ChromeElement { el }) as Box<dyn PageElement + '_>)
            .collect())
    }
}
