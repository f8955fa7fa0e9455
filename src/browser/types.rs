// Core types for element selection and browser faults

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One strategy for locating elements in the current document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SelectorCandidate {
    /// CSS selector
    Css(String),

    /// XPath expression
    XPath(String),

    /// Match on the `name` attribute
    Name(String),

    /// Match on the `id` attribute
    Id(String),

    /// Match on a single class name
    ClassName(String),
}

impl SelectorCandidate {
    pub fn css(selector: impl Into<String>) -> Self {
        SelectorCandidate::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        SelectorCandidate::XPath(expr.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        SelectorCandidate::Name(name.into())
    }

    pub fn id(id: impl Into<String>) -> Self {
        SelectorCandidate::Id(id.into())
    }

    pub fn class_name(class: impl Into<String>) -> Self {
        SelectorCandidate::ClassName(class.into())
    }

    /// The prefix used in the textual form (`css:`, `xpath:`, ...)
    pub fn kind(&self) -> &'static str {
        match self {
            SelectorCandidate::Css(_) => "css",
            SelectorCandidate::XPath(_) => "xpath",
            SelectorCandidate::Name(_) => "name",
            SelectorCandidate::Id(_) => "id",
            SelectorCandidate::ClassName(_) => "class",
        }
    }

    /// The raw expression without its kind tag
    pub fn value(&self) -> &str {
        match self {
            SelectorCandidate::Css(v)
            | SelectorCandidate::XPath(v)
            | SelectorCandidate::Name(v)
            | SelectorCandidate::Id(v)
            | SelectorCandidate::ClassName(v) => v,
        }
    }
}

impl fmt::Display for SelectorCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.value())
    }
}

impl FromStr for SelectorCandidate {
    type Err = BrowserError;

    /// Parses `css:`, `xpath:`, `name:`, `id:` and `class:` prefixed strings.
    /// Unprefixed input starting with `/` or `(` is XPath, anything else CSS.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(BrowserError::InvalidSelector("empty selector".to_string()));
        }

        if let Some((prefix, rest)) = trimmed.split_once(':') {
            let rest = rest.trim();
            let candidate = match prefix {
                "css" => Some(SelectorCandidate::Css(rest.to_string())),
                "xpath" => Some(SelectorCandidate::XPath(rest.to_string())),
                "name" => Some(SelectorCandidate::Name(rest.to_string())),
                "id" => Some(SelectorCandidate::Id(rest.to_string())),
                "class" => Some(SelectorCandidate::ClassName(rest.to_string())),
                _ => None,
            };
            if let Some(candidate) = candidate {
                if candidate.value().is_empty() {
                    return Err(BrowserError::InvalidSelector(format!(
                        "'{}' has an empty expression",
                        trimmed
                    )));
                }
                return Ok(candidate);
            }
        }

        if trimmed.starts_with('/') || trimmed.starts_with('(') {
            Ok(SelectorCandidate::XPath(trimmed.to_string()))
        } else {
            Ok(SelectorCandidate::Css(trimmed.to_string()))
        }
    }
}

impl TryFrom<String> for SelectorCandidate {
    type Error = BrowserError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SelectorCandidate> for String {
    fn from(candidate: SelectorCandidate) -> Self {
        candidate.to_string()
    }
}

/// Ordered list of candidates, evaluated in priority order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectorGroup {
    candidates: Vec<SelectorCandidate>,
}

impl SelectorGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn css(mut self, selector: impl Into<String>) -> Self {
        self.candidates.push(SelectorCandidate::css(selector));
        self
    }

    pub fn xpath(mut self, expr: impl Into<String>) -> Self {
        self.candidates.push(SelectorCandidate::xpath(expr));
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.candidates.push(SelectorCandidate::name(name));
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.candidates.push(SelectorCandidate::id(id));
        self
    }

    pub fn class_name(mut self, class: impl Into<String>) -> Self {
        self.candidates.push(SelectorCandidate::class_name(class));
        self
    }

    pub fn push(mut self, candidate: SelectorCandidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    pub fn candidates(&self) -> &[SelectorCandidate] {
        &self.candidates
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }
}

impl From<SelectorCandidate> for SelectorGroup {
    fn from(candidate: SelectorCandidate) -> Self {
        Self {
            candidates: vec![candidate],
        }
    }
}

impl FromIterator<SelectorCandidate> for SelectorGroup {
    fn from_iter<I: IntoIterator<Item = SelectorCandidate>>(iter: I) -> Self {
        Self {
            candidates: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for SelectorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.candidates.iter().map(|c| c.to_string()).collect();
        write!(f, "[{}]", parts.join(" | "))
    }
}

/// Result type for browser session operations
pub type BrowserResult<T> = Result<T, BrowserError>;

/// Error types for browser session operations
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    /// The WebDriver endpoint rejected or failed a command
    #[error("WebDriver error: {0}")]
    Driver(String),

    /// Selector could not be parsed or evaluated
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// The element handle no longer refers to a live element
    #[error("Stale element: {0}")]
    StaleElement(String),

    /// Interaction was refused (overlay, not interactable, ...)
    #[error("Interaction failed: {0}")]
    Interaction(String),

    /// The session was already torn down
    #[error("Browser session closed")]
    Closed,

    /// Failed to start the async runtime backing the session
    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

impl BrowserError {
    pub fn driver(err: impl fmt::Display) -> Self {
        BrowserError::Driver(err.to_string())
    }
}
