//! Shared helpers for scenario stages.

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::browser::{BrowserSession, SelectorGroup};
use crate::config::ScenarioConfig;
use crate::interact::Interactor;
use crate::locate::{Located, locate_detailed};
use crate::runner::RunResult;
use crate::steps::StepKind;
use crate::wait::Waiter;

/// Everything a stage needs: the session, its configuration, the click
/// strategies and the run being recorded.
pub struct Flow<'a, S: BrowserSession + ?Sized> {
    session: &'a S,
    config: &'a ScenarioConfig,
    interactor: &'a Interactor<S>,
    run: &'a mut RunResult,
    waiter: Waiter,
    page_waiter: Waiter,
}

impl<'a, S: BrowserSession + ?Sized> Flow<'a, S> {
    pub fn new(
        session: &'a S,
        config: &'a ScenarioConfig,
        interactor: &'a Interactor<S>,
        run: &'a mut RunResult,
    ) -> Self {
        Self {
            session,
            config,
            interactor,
            run,
            waiter: config.timeouts.element_waiter(),
            page_waiter: config.timeouts.page_waiter(),
        }
    }

    pub fn session(&self) -> &'a S {
        self.session
    }

    pub fn config(&self) -> &'a ScenarioConfig {
        self.config
    }

    pub fn run(&mut self) -> &mut RunResult {
        &mut *self.run
    }

    pub fn step(&mut self, icon: &str, title: &str, description: &str) {
        self.run.info(icon, title, description);
    }

    pub fn warn(&mut self, icon: &str, title: &str, description: &str) {
        self.run.warning(icon, title, description);
    }

    pub fn fail(&mut self, icon: &str, title: &str, description: &str, details: &str) {
        self.run.record(icon, title, description, StepKind::Error, details);
    }

    /// Info step carrying the current page title and URL
    pub fn page_step(&mut self, icon: &str, title: &str, what: &str) {
        let page_title = self.session.title().unwrap_or_default();
        let url = self.session.current_url().unwrap_or_default();
        self.run.record(
            icon,
            title,
            &format!("{}: \"{}\"", what, page_title),
            StepKind::Info,
            &format!("URL: {}", url),
        );
    }

    /// Navigate, wait for the document and record the loaded page
    pub fn open(&mut self, url: &str) -> Result<()> {
        self.session
            .navigate(url)
            .with_context(|| format!("Failed to open {}", url))?;
        self.settle();

        let title = self.session.title().unwrap_or_default();
        let current = self.session.current_url().unwrap_or_else(|_| url.to_string());
        self.run.set_page(title.as_str(), current.as_str());
        self.run.record(
            "📄",
            "Page Loaded",
            &format!("Page title: \"{}\"", title),
            StepKind::Info,
            &format!("URL: {}", current),
        );
        Ok(())
    }

    /// Wait for `document.readyState`; a slow page is not an error by itself
    pub fn settle(&self) {
        if let Err(err) = self.page_waiter.page_ready(self.session) {
            debug!(error = %err, "page did not report ready");
        }
    }

    /// Single scan of the group, no waiting
    pub fn find(&self, group: &SelectorGroup) -> Option<Located<S::Element>> {
        locate_detailed(self.session, group)
    }

    /// Scan the group until it matches or the element wait runs out
    pub fn find_waiting(&self, group: &SelectorGroup) -> Option<Located<S::Element>> {
        self.waiter
            .until(&format!("presence of {}", group), || locate_detailed(self.session, group))
            .ok()
    }

    pub fn present(&self, group: &SelectorGroup, what: &str) -> Result<S::Element> {
        self.waiter
            .present(self.session, group)
            .with_context(|| format!("{} not found", what))
    }

    pub fn clickable(&self, group: &SelectorGroup, what: &str) -> Result<S::Element> {
        self.waiter
            .clickable(self.session, group)
            .with_context(|| format!("{} is not clickable", what))
    }

    /// Click an element through the fallback strategies
    pub fn click_element(&mut self, element: &S::Element, title: &str) -> bool {
        self.interactor
            .click(self.session, element, self.run.log_mut(), title)
    }

    /// Wait until the group is clickable, then click it
    pub fn click(&mut self, group: &SelectorGroup, title: &str) -> Result<()> {
        let element = self.clickable(group, title)?;
        if !self.click_element(&element, title) {
            bail!("Could not click {}", title);
        }
        Ok(())
    }

    /// Wait for an input and type into it
    pub fn type_into(&mut self, group: &SelectorGroup, text: &str, what: &str) -> Result<S::Element> {
        let element = self.present(group, what)?;
        self.session
            .send_keys(&element, text)
            .with_context(|| format!("Failed to type into {}", what))?;
        Ok(element)
    }

    /// Like [`Flow::type_into`], but waits until the input is clickable
    pub fn type_into_clickable(&mut self, group: &SelectorGroup, text: &str, what: &str) -> Result<S::Element> {
        let element = self.clickable(group, what)?;
        self.session
            .send_keys(&element, text)
            .with_context(|| format!("Failed to type into {}", what))?;
        Ok(element)
    }

    /// Trimmed visible text of the first match
    pub fn text_of(&self, group: &SelectorGroup, what: &str) -> Result<String> {
        let element = self.present(group, what)?;
        let text = self
            .session
            .element_text(&element)
            .with_context(|| format!("Failed to read {}", what))?;
        Ok(text.trim().to_string())
    }

    pub fn hover(&self, group: &SelectorGroup, what: &str) -> Result<()> {
        let element = self.present(group, what)?;
        self.session
            .hover(&element)
            .with_context(|| format!("Failed to hover {}", what))
    }

    pub fn scroll_to(&self, y: i64) -> Result<()> {
        self.session
            .scroll_to(y)
            .with_context(|| format!("Failed to scroll to {}", y))
    }

    /// Scroll an element into view; failures are only logged
    pub fn reveal(&self, element: &S::Element) {
        if let Err(err) = self.session.scroll_into_view(element) {
            debug!(error = %err, "scroll into view failed");
        }
    }
}
