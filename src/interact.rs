//! Multi-strategy clicking.
//!
//! Strategies go from most realistic to most forceful:
//! 1. native element click
//! 2. programmatic `element.click()` through script
//! 3. pointer move onto the element followed by a click
//!
//! The first strategy that succeeds ends the attempt. Each failed strategy is
//! recorded as a warning step; exhausting all of them records an error step.

use crate::browser::{BrowserResult, BrowserSession, SCRIPT_CLICK};
use crate::steps::{StepKind, StepLog};

/// One way of clicking an element
pub trait ClickStrategy<S: BrowserSession + ?Sized> {
    /// Short label used in step descriptions (e.g. "direct")
    fn label(&self) -> &'static str;

    fn attempt(&self, session: &S, element: &S::Element) -> BrowserResult<()>;
}

/// Native WebDriver element click
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeClick;

/// `arguments[0].click()` executed in the page
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptClick;

/// Pointer actions: move to the element center, then click
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerClick;

impl<S: BrowserSession + ?Sized> ClickStrategy<S> for NativeClick {
    fn label(&self) -> &'static str {
        "direct"
    }

    fn attempt(&self, session: &S, element: &S::Element) -> BrowserResult<()> {
        session.click(element)
    }
}

impl<S: BrowserSession + ?Sized> ClickStrategy<S> for ScriptClick {
    fn label(&self) -> &'static str {
        "JavaScript"
    }

    fn attempt(&self, session: &S, element: &S::Element) -> BrowserResult<()> {
        session.execute_script(SCRIPT_CLICK, &[element]).map(|_| ())
    }
}

impl<S: BrowserSession + ?Sized> ClickStrategy<S> for PointerClick {
    fn label(&self) -> &'static str {
        "Actions API"
    }

    fn attempt(&self, session: &S, element: &S::Element) -> BrowserResult<()> {
        session.pointer_click(element)
    }
}

/// Ordered list of click strategies
pub struct Interactor<S: BrowserSession + ?Sized> {
    strategies: Vec<Box<dyn ClickStrategy<S>>>,
}

impl<S: BrowserSession + ?Sized> Interactor<S> {
    /// Native, then script, then pointer
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(NativeClick),
                Box::new(ScriptClick),
                Box::new(PointerClick),
            ],
        }
    }

    /// Use a custom strategy order
    pub fn with_strategies(strategies: Vec<Box<dyn ClickStrategy<S>>>) -> Self {
        Self { strategies }
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.label()).collect()
    }

    /// Click `element`, falling back through the strategies.
    ///
    /// Returns `true` as soon as one strategy succeeds. Every failed attempt
    /// adds a warning step; when all fail an error step is added and `false`
    /// returned so the caller can decide whether that is fatal.
    pub fn click(
        &self,
        session: &S,
        element: &S::Element,
        log: &mut StepLog,
        success_title: &str,
    ) -> bool {
        let mut last_error = None;

        for strategy in &self.strategies {
            match strategy.attempt(session, element) {
                Ok(()) => {
                    log.record(
                        "✅",
                        success_title,
                        &format!("Successfully clicked ({} method)", strategy.label()),
                        StepKind::Info,
                        "",
                    );
                    return true;
                }
                Err(err) => {
                    log.record(
                        "⚠️",
                        "Click Fallback",
                        &format!("{} click failed: {}", strategy.label(), err),
                        StepKind::Warning,
                        "",
                    );
                    last_error = Some(err);
                }
            }
        }

        let reason = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no click strategies configured".to_string());
        log.record(
            "❌",
            "All Click Methods Failed",
            &format!("All click methods failed: {}", reason),
            StepKind::Error,
            "",
        );
        false
    }
}

impl<S: BrowserSession + ?Sized> Default for Interactor<S> {
    fn default() -> Self {
        Self::new()
    }
}
