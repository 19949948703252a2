use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::BrowserSettings;
use crate::error::{Result, ScrapeError};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/98.0.4758.102 Safari/537.36";

const ORIGIN_INPUT: &str = "#origination-flexdatalist";
const DESTINATION_INPUT: &str = "#destination-flexdatalist";
const DATE_INPUT: &str = "#departure_dateh";
const SUBMIT_BUTTON: &str = "#submit";
const RESULTS: &str = "div.data-block.list-kereta";

// chromiumoxide's default switches minus `--enable-automation`, which would
// otherwise mark every session as automated.
const LAUNCH_ARGS: &[&str] = &[
    "--disable-background-networking",
    "--enable-features=NetworkService,NetworkServiceInProcess",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-breakpad",
    "--disable-client-side-phishing-detection",
    "--disable-component-extensions-with-background-pages",
    "--disable-default-apps",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-features=TranslateUI",
    "--disable-hang-monitor",
    "--disable-ipc-flooding-protection",
    "--disable-popup-blocking",
    "--disable-prompt-on-repost",
    "--disable-renderer-backgrounding",
    "--disable-sync",
    "--force-color-profile=srgb",
    "--metrics-recording-only",
    "--no-first-run",
    "--password-store=basic",
    "--use-mock-keychain",
    "--disable-blink-features=AutomationControlled",
    "--start-maximized",
    "--disable-gpu",
];

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const SUGGESTION_DELAY: Duration = Duration::from_secs(1);
const KEY_DELAY: Duration = Duration::from_millis(500);

/// Raw outcome of one search. `html` is `None` whenever anything went wrong;
/// callers don't get told why.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    pub html: Option<String>,
    pub url: Option<String>,
}

#[async_trait(?Send)]
pub trait PageFetcher {
    async fn fetch_page(&self, origin: &str, destination: &str, date_input: &str) -> FetchedPage;
}

/// One Chrome instance for the whole run. Call `shutdown` exactly once.
pub struct ChromeSession {
    browser: Browser,
    handler: JoinHandle<()>,
    settings: BrowserSettings,
}

impl ChromeSession {
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let config = browser_config(settings)?;

        let (browser, mut events) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::BrowserLaunch(e.to_string()))?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    debug!("Browser event error: {}", e);
                }
            }
        });

        info!("Browser started (headless: {})", settings.headless);
        Ok(ChromeSession {
            browser,
            handler,
            settings: settings.clone(),
        })
    }

    pub async fn shutdown(mut self) {
        info!("Closing browser...");
        if let Err(e) = self.browser.close().await {
            warn!("Browser did not close cleanly: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Waiting for browser exit failed: {}", e);
        }
        if let Err(e) = self.handler.await {
            debug!("Browser handler task ended abnormally: {}", e);
        }
        info!("Browser closed");
    }

    async fn try_fetch(
        &self,
        origin: &str,
        destination: &str,
        date_input: &str,
    ) -> Result<(String, Option<String>)> {
        info!("Navigating to {}", self.settings.booking_url);
        let page = self.browser.new_page(self.settings.booking_url.as_str()).await?;
        let result = self.search(&page, origin, destination, date_input).await;
        if let Err(e) = page.close().await {
            debug!("Closing tab failed: {}", e);
        }
        result
    }

    async fn search(
        &self,
        page: &Page,
        origin: &str,
        destination: &str,
        date_input: &str,
    ) -> Result<(String, Option<String>)> {
        let timeout = self.settings.element_timeout();

        debug!("Origin: {}", origin);
        fill_station(page, ORIGIN_INPUT, origin, timeout).await?;
        debug!("Destination: {}", destination);
        fill_station(page, DESTINATION_INPUT, destination, timeout).await?;

        // The date picker ignores typed input; set the value and fire change.
        debug!("Departure date: {}", date_input);
        let date = wait_for_element(page, DATE_INPUT, timeout).await?;
        let literal = serde_json::Value::from(date_input).to_string();
        date.call_js_fn(
            format!(
                "function() {{ this.value = {literal}; \
                 if (window.jQuery) {{ window.jQuery(this).trigger('change'); }} \
                 else {{ this.dispatchEvent(new Event('change', {{ bubbles: true }})); }} }}"
            ),
            false,
        )
        .await?;
        sleep(KEY_DELAY).await;

        debug!("Submitting search");
        wait_for_element(page, SUBMIT_BUTTON, timeout)
            .await?
            .click()
            .await?;

        info!("Waiting for search results...");
        wait_for_element(page, RESULTS, timeout).await?;
        info!("Results page detected");
        sleep(self.settings.settle()).await;

        let html = page.content().await?;
        let url = page.url().await?;
        Ok((html, url))
    }
}

#[async_trait(?Send)]
impl PageFetcher for ChromeSession {
    async fn fetch_page(&self, origin: &str, destination: &str, date_input: &str) -> FetchedPage {
        match self.try_fetch(origin, destination, date_input).await {
            Ok((html, url)) => FetchedPage {
                html: Some(html),
                url,
            },
            Err(e) => {
                warn!("Search {} -> {} on {} failed: {}", origin, destination, date_input, e);
                FetchedPage::default()
            }
        }
    }
}

/// Launch options: desktop user agent, fixed window, no automation switch.
fn browser_config(settings: &BrowserSettings) -> Result<BrowserConfig> {
    let mut builder = BrowserConfig::builder()
        .disable_default_args()
        .args(LAUNCH_ARGS.iter().copied())
        .arg(format!("--user-agent={}", USER_AGENT))
        .window_size(1920, 1080);
    if !settings.headless {
        builder = builder.with_head();
    }
    match settings.executable() {
        Some(path) => builder = builder.chrome_executable(path),
        None => info!("No browser path configured, searching PATH"),
    }
    builder.build().map_err(ScrapeError::BrowserLaunch)
}

/// Type into an autocomplete input and accept the first suggestion.
async fn fill_station(page: &Page, selector: &str, name: &str, timeout: Duration) -> Result<()> {
    let input = wait_for_element(page, selector, timeout).await?;
    input.call_js_fn("function() { this.value = ''; }", false).await?;
    input.click().await?;
    input.type_str(name).await?;
    sleep(SUGGESTION_DELAY).await;
    input.press_key("ArrowDown").await?;
    sleep(KEY_DELAY).await;
    input.press_key("Enter").await?;
    sleep(KEY_DELAY).await;
    Ok(())
}

async fn wait_for_element(page: &Page, selector: &str, timeout: Duration) -> Result<Element> {
    let deadline = Instant::now() + timeout;
    loop {
        match page.find_element(selector).await {
            Ok(element) => return Ok(element),
            Err(_) if Instant::now() < deadline => sleep(POLL_INTERVAL).await,
            Err(_) => {
                return Err(ScrapeError::ElementTimeout {
                    selector: selector.to_string(),
                    waited_secs: timeout.as_secs(),
                })
            }
        }
    }
}
