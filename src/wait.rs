//! Bounded condition polling.
//!
//! A [`Waiter`] blocks the calling thread, re-checking a condition at a fixed
//! interval until it holds or the timeout elapses.

use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::browser::{BrowserSession, SCRIPT_READY_STATE, SelectorGroup};
use crate::locate::locate;

/// Result type for wait operations
pub type WaitResult<T> = Result<T, WaitError>;

/// Error types for wait operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WaitError {
    /// The condition did not hold before the deadline
    #[error("Timed out after {timeout:?} waiting for {what}")]
    Timeout { what: String, timeout: Duration },
}

/// Polls a condition until it holds or a timeout elapses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Waiter {
    timeout: Duration,
    poll_interval: Duration,
}

impl Waiter {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Same poll interval, different timeout
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self { timeout, ..*self }
    }

    /// Poll `check` until it yields a value.
    ///
    /// The check always runs at least once, even with a zero timeout.
    pub fn until<T, F>(&self, what: &str, mut check: F) -> WaitResult<T>
    where
        F: FnMut() -> Option<T>,
    {
        let deadline = Instant::now() + self.timeout;
        let mut polls = 0usize;
        loop {
            polls += 1;
            if let Some(value) = check() {
                debug!(what, polls, "wait satisfied");
                return Ok(value);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(WaitError::Timeout {
                    what: what.to_string(),
                    timeout: self.timeout,
                });
            }
            thread::sleep(self.poll_interval.min(deadline - now));
        }
    }

    /// Wait until the group locates an element
    pub fn present<S>(&self, session: &S, group: &SelectorGroup) -> WaitResult<S::Element>
    where
        S: BrowserSession + ?Sized,
    {
        self.until(&format!("presence of {}", group), || locate(session, group))
    }

    /// Wait until the group locates an element that is displayed and enabled
    pub fn clickable<S>(&self, session: &S, group: &SelectorGroup) -> WaitResult<S::Element>
    where
        S: BrowserSession + ?Sized,
    {
        self.until(&format!("clickable {}", group), || {
            let element = locate(session, group)?;
            let displayed = session.is_displayed(&element).unwrap_or(false);
            let enabled = session.is_enabled(&element).unwrap_or(false);
            (displayed && enabled).then_some(element)
        })
    }

    /// Wait until `document.readyState` reports `complete`
    pub fn page_ready<S>(&self, session: &S) -> WaitResult<()>
    where
        S: BrowserSession + ?Sized,
    {
        self.until("document ready", || {
            let state = session.execute_script(SCRIPT_READY_STATE, &[]).ok()?;
            (state.as_str() == Some("complete")).then_some(())
        })
    }
}
