//! Browser session abstraction.
//!
//! Every piece of the runner talks to the page through [`BrowserSession`]:
//! - `WebDriverSession` drives a real browser over the W3C WebDriver protocol
//! - `MockBrowser` scripts a fake document for tests

use std::fmt::Debug;

use super::types::{BrowserResult, SelectorCandidate};

/// Script used for the programmatic click strategy
pub const SCRIPT_CLICK: &str = "arguments[0].click();";

/// Script used to bring an element into the viewport
pub const SCRIPT_SCROLL_INTO_VIEW: &str =
    "arguments[0].scrollIntoView({behavior: 'smooth', block: 'center'});";

/// Script that reports document readiness
pub const SCRIPT_READY_STATE: &str = "return document.readyState;";

/// Capability set of a live browser session.
///
/// Calls are synchronous and block until the browser answers. Element handles
/// are only valid while the document they came from is alive.
pub trait BrowserSession {
    /// Handle to an element in the current document
    type Element: Clone + Debug;

    /// Load a URL in the current window
    fn navigate(&self, url: &str) -> BrowserResult<()>;

    /// Find all elements matching one selector candidate
    fn find_elements(&self, selector: &SelectorCandidate) -> BrowserResult<Vec<Self::Element>>;

    /// Native click on the element
    fn click(&self, element: &Self::Element) -> BrowserResult<()>;

    /// Move the pointer onto the element and click with the primary button
    fn pointer_click(&self, element: &Self::Element) -> BrowserResult<()>;

    /// Move the pointer onto the element without clicking
    fn hover(&self, element: &Self::Element) -> BrowserResult<()>;

    /// Type text into the element
    fn send_keys(&self, element: &Self::Element, text: &str) -> BrowserResult<()>;

    /// Press the Enter key in the element
    fn press_enter(&self, element: &Self::Element) -> BrowserResult<()>;

    /// Clear the value of an input element
    fn clear(&self, element: &Self::Element) -> BrowserResult<()>;

    /// Visible text of the element
    fn element_text(&self, element: &Self::Element) -> BrowserResult<String>;

    fn is_displayed(&self, element: &Self::Element) -> BrowserResult<bool>;

    fn is_enabled(&self, element: &Self::Element) -> BrowserResult<bool>;

    /// Execute a script with element arguments bound to `arguments[i]`
    fn execute_script(
        &self,
        script: &str,
        args: &[&Self::Element],
    ) -> BrowserResult<serde_json::Value>;

    /// PNG-encoded screenshot of the viewport
    fn screenshot(&self) -> BrowserResult<Vec<u8>>;

    fn current_url(&self) -> BrowserResult<String>;

    fn title(&self) -> BrowserResult<String>;

    /// Enter the frame with the given name or id
    fn switch_to_frame(&self, name: &str) -> BrowserResult<()>;

    /// Return to the top-level document
    fn switch_to_default_content(&self) -> BrowserResult<()>;

    fn accept_alert(&self) -> BrowserResult<()>;

    fn dismiss_alert(&self) -> BrowserResult<()>;

    fn maximize(&self) -> BrowserResult<()>;

    /// Browser user agent string
    fn user_agent(&self) -> BrowserResult<String> {
        let value = self.execute_script("return navigator.userAgent;", &[])?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Scroll the window to an absolute vertical offset
    fn scroll_to(&self, y: i64) -> BrowserResult<()> {
        self.execute_script(&format!("window.scrollTo(0, {});", y), &[])?;
        Ok(())
    }

    /// Scroll the element into the middle of the viewport
    fn scroll_into_view(&self, element: &Self::Element) -> BrowserResult<()> {
        self.execute_script(SCRIPT_SCROLL_INTO_VIEW, &[element])?;
        Ok(())
    }

    /// End the session. Later calls fail with `BrowserError::Closed`.
    fn quit(&self) -> BrowserResult<()>;
}

/// Browser name and version parsed from a user agent string.
///
/// Recognises Edge, Chrome and Firefox tokens; anything else is reported as
/// the whole user agent with an empty version.
pub fn parse_user_agent(user_agent: &str) -> (String, String) {
    const TOKENS: [(&str, &str); 3] = [
        ("Edg/", "Edge"),
        ("Chrome/", "Chrome"),
        ("Firefox/", "Firefox"),
    ];

    for (token, name) in TOKENS {
        if let Some(idx) = user_agent.find(token) {
            let version: String = user_agent[idx + token.len()..]
                .chars()
                .take_while(|c| !c.is_whitespace())
                .collect();
            return (name.to_string(), version);
        }
    }
    (user_agent.to_string(), String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_agent_chrome() {
        let ua = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.6478.126 Safari/537.36";
        assert_eq!(
            parse_user_agent(ua),
            ("Chrome".to_string(), "126.0.6478.126".to_string())
        );
    }

    #[test]
    fn test_parse_user_agent_edge_wins_over_chrome() {
        let ua = "Mozilla/5.0 AppleWebKit/537.36 Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.91";
        assert_eq!(parse_user_agent(ua).0, "Edge");
        assert_eq!(parse_user_agent(ua).1, "120.0.2210.91");
    }

    #[test]
    fn test_parse_user_agent_unknown() {
        assert_eq!(
            parse_user_agent("curl/8.0"),
            ("curl/8.0".to_string(), String::new())
        );
    }
}
