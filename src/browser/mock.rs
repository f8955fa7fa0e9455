//! Scripted in-process browser for tests.
//!
//! `MockBrowser` answers selector lookups from a rule table instead of a real
//! document. Rules can make a selector match N elements, fault, appear only
//! after a number of lookups, or refuse specific click methods. Every lookup
//! and interaction is recorded so tests can assert on what was tried.

use image::{ImageBuffer, RgbImage};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;

use super::backend::{BrowserSession, SCRIPT_CLICK, SCRIPT_READY_STATE};
use super::types::{BrowserError, BrowserResult, SelectorCandidate};

/// Default user agent reported by the mock
pub const MOCK_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Screenshot dimensions produced by the mock
pub const MOCK_SCREENSHOT_SIZE: (u32, u32) = (64, 48);

/// Way an element was clicked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickMethod {
    Native,
    Script,
    Pointer,
}

/// Element handle returned by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    /// Selector (in `kind:value` form) that produced the element
    pub selector: String,
    /// Position within the match list
    pub index: usize,
}

/// A recorded interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockClick {
    pub method: ClickMethod,
    pub selector: String,
}

#[derive(Debug, Clone)]
struct SelectorRule {
    matches: usize,
    fault: bool,
    appear_after: usize,
    text: String,
    displayed: bool,
    enabled: bool,
    clear_fault: bool,
    click_faults: HashSet<ClickMethod>,
}

impl SelectorRule {
    fn matching(count: usize) -> Self {
        Self {
            matches: count,
            fault: false,
            appear_after: 0,
            text: String::new(),
            displayed: true,
            enabled: true,
            clear_fault: false,
            click_faults: HashSet::new(),
        }
    }
}

#[derive(Debug)]
struct MockState {
    rules: HashMap<String, SelectorRule>,
    lookups: HashMap<String, usize>,
    evaluated: Vec<String>,
    pages: HashMap<String, String>,
    url: String,
    title: String,
    frame: Option<String>,
    frames: HashSet<String>,
    alert_open: bool,
    loading_polls: usize,
    clicks: Vec<MockClick>,
    typed: Vec<(String, String)>,
    scroll_y: i64,
    user_agent: String,
    closed: bool,
}

/// A fake browser session driven by selector rules
#[derive(Debug)]
pub struct MockBrowser {
    /// Unknown selectors match one element when set
    permissive: bool,
    state: RefCell<MockState>,
}

fn selector_key(selector: &str) -> String {
    selector
        .parse::<SelectorCandidate>()
        .map(|c| c.to_string())
        .unwrap_or_else(|_| selector.to_string())
}

impl MockBrowser {
    /// A browser where only configured selectors match anything
    pub fn new() -> Self {
        Self {
            permissive: false,
            state: RefCell::new(MockState {
                rules: HashMap::new(),
                lookups: HashMap::new(),
                evaluated: Vec::new(),
                pages: HashMap::new(),
                url: "about:blank".to_string(),
                title: String::new(),
                frame: None,
                frames: HashSet::new(),
                alert_open: false,
                loading_polls: 0,
                clicks: Vec::new(),
                typed: Vec::new(),
                scroll_y: 0,
                user_agent: MOCK_USER_AGENT.to_string(),
                closed: false,
            }),
        }
    }

    /// A browser where every selector without a rule matches one element
    pub fn permissive() -> Self {
        Self {
            permissive: true,
            ..Self::new()
        }
    }

    fn rule_mut<F: FnOnce(&mut SelectorRule)>(self, selector: &str, default: usize, f: F) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let rule = state
                .rules
                .entry(selector_key(selector))
                .or_insert_with(|| SelectorRule::matching(default));
            f(rule);
        }
        self
    }

    /// Make the selector match `count` elements
    pub fn with_element(self, selector: &str, count: usize) -> Self {
        self.rule_mut(selector, count, |r| r.matches = count)
    }

    /// Make the selector match nothing (useful in permissive mode)
    pub fn with_missing(self, selector: &str) -> Self {
        self.rule_mut(selector, 0, |r| r.matches = 0)
    }

    /// Make evaluating the selector raise a fault
    pub fn with_fault(self, selector: &str) -> Self {
        self.rule_mut(selector, 0, |r| r.fault = true)
    }

    /// Selector matches only after `lookups` failed lookups
    pub fn with_delayed(self, selector: &str, lookups: usize) -> Self {
        self.rule_mut(selector, 1, |r| r.appear_after = lookups)
    }

    /// Text returned for elements of this selector
    pub fn with_text(self, selector: &str, text: &str) -> Self {
        self.rule_mut(selector, 1, |r| r.text = text.to_string())
    }

    pub fn with_hidden(self, selector: &str) -> Self {
        self.rule_mut(selector, 1, |r| r.displayed = false)
    }

    pub fn with_disabled(self, selector: &str) -> Self {
        self.rule_mut(selector, 1, |r| r.enabled = false)
    }

    /// Clicking elements of this selector with `method` raises a fault
    pub fn with_click_fault(self, selector: &str, method: ClickMethod) -> Self {
        self.rule_mut(selector, 1, |r| {
            r.click_faults.insert(method);
        })
    }

    /// Clearing elements of this selector raises a fault
    pub fn with_clear_fault(self, selector: &str) -> Self {
        self.rule_mut(selector, 1, |r| r.clear_fault = true)
    }

    /// Title reported after navigating to `url`
    pub fn with_page(self, url: &str, title: &str) -> Self {
        self.state
            .borrow_mut()
            .pages
            .insert(url.to_string(), title.to_string());
        self
    }

    /// A frame that `switch_to_frame` accepts. Without any, every frame is accepted.
    pub fn with_frame(self, name: &str) -> Self {
        self.state.borrow_mut().frames.insert(name.to_string());
        self
    }

    /// Report `document.readyState == "loading"` for the next `polls` checks
    pub fn with_loading_polls(self, polls: usize) -> Self {
        self.state.borrow_mut().loading_polls = polls;
        self
    }

    pub fn with_alert(self) -> Self {
        self.state.borrow_mut().alert_open = true;
        self
    }

    /// Number of times a selector was evaluated
    pub fn lookups(&self, selector: &str) -> usize {
        self.state
            .borrow()
            .lookups
            .get(&selector_key(selector))
            .copied()
            .unwrap_or(0)
    }

    /// All evaluated selectors in evaluation order
    pub fn evaluated(&self) -> Vec<String> {
        self.state.borrow().evaluated.clone()
    }

    pub fn clicks(&self) -> Vec<MockClick> {
        self.state.borrow().clicks.clone()
    }

    /// (selector, text) pairs typed into elements
    pub fn typed(&self) -> Vec<(String, String)> {
        self.state.borrow().typed.clone()
    }

    pub fn current_frame(&self) -> Option<String> {
        self.state.borrow().frame.clone()
    }

    pub fn scroll_position(&self) -> i64 {
        self.state.borrow().scroll_y
    }

    pub fn alert_open(&self) -> bool {
        self.state.borrow().alert_open
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    fn ensure_open(&self) -> BrowserResult<()> {
        if self.state.borrow().closed {
            Err(BrowserError::Closed)
        } else {
            Ok(())
        }
    }

    fn rule_for(&self, element: &MockElement) -> SelectorRule {
        self.state
            .borrow()
            .rules
            .get(&element.selector)
            .cloned()
            .unwrap_or_else(|| SelectorRule::matching(1))
    }

    fn record_click(&self, element: &MockElement, method: ClickMethod) -> BrowserResult<()> {
        self.ensure_open()?;
        let rule = self.rule_for(element);
        if rule.click_faults.contains(&method) {
            return Err(BrowserError::Interaction(format!(
                "element {} is not clickable at point (other element would receive the click)",
                element.selector
            )));
        }
        self.state.borrow_mut().clicks.push(MockClick {
            method,
            selector: element.selector.clone(),
        });
        Ok(())
    }

    fn render_png(&self) -> BrowserResult<Vec<u8>> {
        let (width, height) = MOCK_SCREENSHOT_SIZE;
        let img: RgbImage = ImageBuffer::from_pixel(width, height, image::Rgb([245, 245, 245]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| BrowserError::Driver(format!("Failed to encode PNG: {}", e)))?;
        Ok(bytes)
    }
}

impl Default for MockBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserSession for MockBrowser {
    type Element = MockElement;

    fn navigate(&self, url: &str) -> BrowserResult<()> {
        self.ensure_open()?;
        let mut state = self.state.borrow_mut();
        state.title = state.pages.get(url).cloned().unwrap_or_default();
        state.url = url.to_string();
        state.frame = None;
        state.scroll_y = 0;
        Ok(())
    }

    fn find_elements(&self, selector: &SelectorCandidate) -> BrowserResult<Vec<MockElement>> {
        self.ensure_open()?;
        let key = selector.to_string();
        let mut state = self.state.borrow_mut();
        state.evaluated.push(key.clone());
        let seen = {
            let counter = state.lookups.entry(key.clone()).or_insert(0);
            *counter += 1;
            *counter
        };

        let matches = match state.rules.get(&key) {
            Some(rule) if rule.fault => {
                return Err(BrowserError::InvalidSelector(format!(
                    "failed to evaluate {}",
                    key
                )));
            }
            Some(rule) if seen <= rule.appear_after => 0,
            Some(rule) => rule.matches,
            None if self.permissive => 1,
            None => 0,
        };

        Ok((0..matches)
            .map(|index| MockElement {
                selector: key.clone(),
                index,
            })
            .collect())
    }

    fn click(&self, element: &MockElement) -> BrowserResult<()> {
        self.record_click(element, ClickMethod::Native)
    }

    fn pointer_click(&self, element: &MockElement) -> BrowserResult<()> {
        self.record_click(element, ClickMethod::Pointer)
    }

    fn hover(&self, _element: &MockElement) -> BrowserResult<()> {
        self.ensure_open()
    }

    fn send_keys(&self, element: &MockElement, text: &str) -> BrowserResult<()> {
        self.ensure_open()?;
        self.state
            .borrow_mut()
            .typed
            .push((element.selector.clone(), text.to_string()));
        Ok(())
    }

    fn press_enter(&self, element: &MockElement) -> BrowserResult<()> {
        self.send_keys(element, "\n")
    }

    fn clear(&self, element: &MockElement) -> BrowserResult<()> {
        self.ensure_open()?;
        if self.rule_for(element).clear_fault {
            return Err(BrowserError::Interaction(format!(
                "invalid element state: {} cannot be cleared",
                element.selector
            )));
        }
        Ok(())
    }

    fn element_text(&self, element: &MockElement) -> BrowserResult<String> {
        self.ensure_open()?;
        Ok(self.rule_for(element).text)
    }

    fn is_displayed(&self, element: &MockElement) -> BrowserResult<bool> {
        self.ensure_open()?;
        Ok(self.rule_for(element).displayed)
    }

    fn is_enabled(&self, element: &MockElement) -> BrowserResult<bool> {
        self.ensure_open()?;
        Ok(self.rule_for(element).enabled)
    }

    fn execute_script(
        &self,
        script: &str,
        args: &[&MockElement],
    ) -> BrowserResult<serde_json::Value> {
        self.ensure_open()?;

        if script == SCRIPT_CLICK {
            let element = args
                .first()
                .ok_or_else(|| BrowserError::Driver("click script needs an element".to_string()))?;
            self.record_click(element, ClickMethod::Script)?;
            return Ok(serde_json::Value::Null);
        }

        if script == SCRIPT_READY_STATE {
            let mut state = self.state.borrow_mut();
            if state.loading_polls > 0 {
                state.loading_polls -= 1;
                return Ok(serde_json::Value::String("loading".to_string()));
            }
            return Ok(serde_json::Value::String("complete".to_string()));
        }

        if script.contains("navigator.userAgent") {
            return Ok(serde_json::Value::String(self.state.borrow().user_agent.clone()));
        }

        if let Some(offset) = script
            .strip_prefix("window.scrollTo(0, ")
            .and_then(|rest| rest.strip_suffix(");"))
        {
            let y = offset
                .trim()
                .parse()
                .map_err(|_| BrowserError::Driver(format!("bad scroll offset in '{}'", script)))?;
            self.state.borrow_mut().scroll_y = y;
        }

        Ok(serde_json::Value::Null)
    }

    fn screenshot(&self) -> BrowserResult<Vec<u8>> {
        self.ensure_open()?;
        self.render_png()
    }

    fn current_url(&self) -> BrowserResult<String> {
        self.ensure_open()?;
        Ok(self.state.borrow().url.clone())
    }

    fn title(&self) -> BrowserResult<String> {
        self.ensure_open()?;
        Ok(self.state.borrow().title.clone())
    }

    fn switch_to_frame(&self, name: &str) -> BrowserResult<()> {
        self.ensure_open()?;
        let mut state = self.state.borrow_mut();
        if !state.frames.is_empty() && !state.frames.contains(name) {
            return Err(BrowserError::Driver(format!("no such frame: {}", name)));
        }
        state.frame = Some(name.to_string());
        Ok(())
    }

    fn switch_to_default_content(&self) -> BrowserResult<()> {
        self.ensure_open()?;
        self.state.borrow_mut().frame = None;
        Ok(())
    }

    fn accept_alert(&self) -> BrowserResult<()> {
        self.dismiss_alert()
    }

    fn dismiss_alert(&self) -> BrowserResult<()> {
        self.ensure_open()?;
        let mut state = self.state.borrow_mut();
        if !state.alert_open {
            return Err(BrowserError::Driver("no such alert".to_string()));
        }
        state.alert_open = false;
        Ok(())
    }

    fn maximize(&self) -> BrowserResult<()> {
        self.ensure_open()
    }

    fn quit(&self) -> BrowserResult<()> {
        self.ensure_open()?;
        self.state.borrow_mut().closed = true;
        Ok(())
    }
}
