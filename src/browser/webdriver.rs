//! WebDriver-backed browser session.
//!
//! Wraps a `thirtyfour` client and a current-thread tokio runtime so the rest
//! of the runner can stay synchronous: every trait call blocks on the runtime
//! until the WebDriver endpoint answers.

use std::cell::RefCell;
use std::time::Duration;

use thirtyfour::prelude::*;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use super::backend::BrowserSession;
use super::types::{BrowserError, BrowserResult, SelectorCandidate};

/// Options used when opening a WebDriver session
#[derive(Debug, Clone)]
pub struct WebDriverOptions {
    /// WebDriver endpoint, e.g. a running chromedriver
    pub server_url: String,
    /// Run Chrome without a visible window
    pub headless: bool,
    /// Maximize the window after start
    pub maximize: bool,
    /// Page load timeout applied to navigation
    pub page_load_timeout: Duration,
}

impl WebDriverOptions {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            headless: false,
            maximize: true,
            page_load_timeout: Duration::from_secs(60),
        }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn maximize(mut self, maximize: bool) -> Self {
        self.maximize = maximize;
        self
    }

    pub fn page_load_timeout(mut self, timeout: Duration) -> Self {
        self.page_load_timeout = timeout;
        self
    }
}

/// W3C WebDriver code point of the Enter key
pub const KEY_ENTER: &str = "\u{E007}";

/// A live Chrome session driven over WebDriver
///
/// ```no_run
/// use checkout_runner::browser::{
///     BrowserSession, SelectorCandidate, WebDriverOptions, WebDriverSession,
/// };
///
/// let session = WebDriverSession::connect(&WebDriverOptions::new("http://localhost:9515")).unwrap();
/// session.navigate("https://backoffice.example/").unwrap();
/// let search = session
///     .find_elements(&SelectorCandidate::name("query"))
///     .unwrap()
///     .remove(0);
/// session.send_keys(&search, "31544").unwrap();
/// session.press_enter(&search).unwrap();
/// session.switch_to_frame("payment").unwrap();
/// session.quit().unwrap();
/// ```
pub struct WebDriverSession {
    runtime: Runtime,
    driver: RefCell<Option<WebDriver>>,
}

impl std::fmt::Debug for WebDriverSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDriverSession")
            .field("open", &self.driver.borrow().is_some())
            .finish()
    }
}

impl WebDriverSession {
    /// Connect to the WebDriver endpoint and open a Chrome session
    pub fn connect(options: &WebDriverOptions) -> BrowserResult<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;

        info!(server = %options.server_url, headless = options.headless, "Opening WebDriver session");

        let driver = runtime.block_on(async {
            let mut caps = DesiredCapabilities::chrome();
            if options.headless {
                caps.set_headless()?;
            }
            let driver = WebDriver::new(&options.server_url, caps).await?;
            driver
                .set_page_load_timeout(options.page_load_timeout)
                .await?;
            Ok::<_, WebDriverError>(driver)
        });
        let driver = driver.map_err(BrowserError::driver)?;

        let session = Self {
            runtime,
            driver: RefCell::new(Some(driver)),
        };
        if options.maximize {
            session.maximize()?;
        }
        Ok(session)
    }

    /// Run a command against the open driver
    fn with_driver<T, F, Fut>(&self, command: F) -> BrowserResult<T>
    where
        F: FnOnce(WebDriver) -> Fut,
        Fut: std::future::Future<Output = WebDriverResult<T>>,
    {
        let driver = self
            .driver
            .borrow()
            .as_ref()
            .cloned()
            .ok_or(BrowserError::Closed)?;
        self.runtime
            .block_on(command(driver))
            .map_err(map_driver_error)
    }

    /// Run a command against an element handle
    fn with_element<T, F, Fut>(&self, element: &WebElement, command: F) -> BrowserResult<T>
    where
        F: FnOnce(WebElement) -> Fut,
        Fut: std::future::Future<Output = WebDriverResult<T>>,
    {
        if self.driver.borrow().is_none() {
            return Err(BrowserError::Closed);
        }
        self.runtime
            .block_on(command(element.clone()))
            .map_err(map_driver_error)
    }
}

fn map_driver_error(err: WebDriverError) -> BrowserError {
    let message = err.to_string();
    if message.contains("stale element") {
        BrowserError::StaleElement(message)
    } else if message.contains("not interactable") || message.contains("click intercepted") {
        BrowserError::Interaction(message)
    } else if message.contains("invalid selector") {
        BrowserError::InvalidSelector(message)
    } else {
        BrowserError::Driver(message)
    }
}

impl BrowserSession for WebDriverSession {
    type Element = WebElement;

    fn navigate(&self, url: &str) -> BrowserResult<()> {
        debug!(url, "navigate");
        self.with_driver(|driver| async move { driver.goto(url).await })
    }

    fn find_elements(&self, selector: &SelectorCandidate) -> BrowserResult<Vec<WebElement>> {
        let value = selector.value();
        self.with_driver(|driver| async move {
            match selector {
                SelectorCandidate::Css(_) => driver.find_all(By::Css(value)).await,
                SelectorCandidate::XPath(_) => driver.find_all(By::XPath(value)).await,
                SelectorCandidate::Name(_) => driver.find_all(By::Name(value)).await,
                SelectorCandidate::Id(_) => driver.find_all(By::Id(value)).await,
                SelectorCandidate::ClassName(_) => driver.find_all(By::ClassName(value)).await,
            }
        })
    }

    fn click(&self, element: &WebElement) -> BrowserResult<()> {
        self.with_element(element, |el| async move { el.click().await })
    }

    fn pointer_click(&self, element: &WebElement) -> BrowserResult<()> {
        self.with_driver(|driver| async move {
            driver
                .action_chain()
                .move_to_element_center(element)
                .click()
                .perform()
                .await
        })
    }

    fn hover(&self, element: &WebElement) -> BrowserResult<()> {
        self.with_driver(|driver| async move {
            driver
                .action_chain()
                .move_to_element_center(element)
                .perform()
                .await
        })
    }

    fn send_keys(&self, element: &WebElement, text: &str) -> BrowserResult<()> {
        self.with_element(element, |el| async move { el.send_keys(text).await })
    }

    fn press_enter(&self, element: &WebElement) -> BrowserResult<()> {
        self.with_element(element, |el| async move { el.send_keys(KEY_ENTER).await })
    }

    fn clear(&self, element: &WebElement) -> BrowserResult<()> {
        self.with_element(element, |el| async move { el.clear().await })
    }

    fn element_text(&self, element: &WebElement) -> BrowserResult<String> {
        self.with_element(element, |el| async move { el.text().await })
    }

    fn is_displayed(&self, element: &WebElement) -> BrowserResult<bool> {
        self.with_element(element, |el| async move { el.is_displayed().await })
    }

    fn is_enabled(&self, element: &WebElement) -> BrowserResult<bool> {
        self.with_element(element, |el| async move { el.is_enabled().await })
    }

    fn execute_script(
        &self,
        script: &str,
        args: &[&WebElement],
    ) -> BrowserResult<serde_json::Value> {
        let args = args
            .iter()
            .map(|el| el.to_json())
            .collect::<WebDriverResult<Vec<_>>>()
            .map_err(map_driver_error)?;
        self.with_driver(|driver| async move {
            let ret = driver.execute(script, args).await?;
            Ok(ret.json().clone())
        })
    }

    fn screenshot(&self) -> BrowserResult<Vec<u8>> {
        self.with_driver(|driver| async move { driver.screenshot_as_png().await })
    }

    fn current_url(&self) -> BrowserResult<String> {
        self.with_driver(|driver| async move { Ok(driver.current_url().await?.to_string()) })
    }

    fn title(&self) -> BrowserResult<String> {
        self.with_driver(|driver| async move { driver.title().await })
    }

    fn switch_to_frame(&self, name: &str) -> BrowserResult<()> {
        let selector = frame_selector(name);
        self.with_driver(|driver| async move {
            let frame = driver.find(By::Css(selector.as_str())).await?;
            frame.enter_frame().await
        })
    }

    fn switch_to_default_content(&self) -> BrowserResult<()> {
        self.with_driver(|driver| async move { driver.enter_default_frame().await })
    }

    fn accept_alert(&self) -> BrowserResult<()> {
        self.with_driver(|driver| async move { driver.accept_alert().await })
    }

    fn dismiss_alert(&self) -> BrowserResult<()> {
        self.with_driver(|driver| async move { driver.dismiss_alert().await })
    }

    fn maximize(&self) -> BrowserResult<()> {
        self.with_driver(|driver| async move { driver.maximize_window().await })
    }

    fn quit(&self) -> BrowserResult<()> {
        let driver = self.driver.borrow_mut().take().ok_or(BrowserError::Closed)?;
        info!("Closing WebDriver session");
        self.runtime
            .block_on(driver.quit())
            .map_err(map_driver_error)
    }
}

/// CSS selector matching a frame by name or id
fn frame_selector(name: &str) -> String {
    let quoted = css_string(name);
    format!(
        "iframe[name={0}], iframe[id={0}], frame[name={0}]",
        quoted
    )
}

/// Quote a value as a CSS string literal
fn css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\'' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\a "),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}
