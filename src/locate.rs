//! Fallback element location.

use tracing::debug;

use crate::browser::{BrowserSession, SelectorCandidate, SelectorGroup};

/// Outcome of a successful lookup
#[derive(Debug, Clone)]
pub struct Located<E> {
    /// First element matched by the winning candidate
    pub element: E,
    /// The candidate that produced the match
    pub candidate: SelectorCandidate,
    /// How many elements that candidate matched
    pub match_count: usize,
}

/// Return the first element of the first candidate that matches anything.
///
/// Candidates are evaluated strictly in order and the scan stops at the first
/// one yielding a match. A candidate whose evaluation faults counts as no
/// match. Nothing is cached between calls.
pub fn locate<S>(session: &S, group: &SelectorGroup) -> Option<S::Element>
where
    S: BrowserSession + ?Sized,
{
    locate_detailed(session, group).map(|found| found.element)
}

/// Like [`locate`], also reporting which candidate won.
pub fn locate_detailed<S>(session: &S, group: &SelectorGroup) -> Option<Located<S::Element>>
where
    S: BrowserSession + ?Sized,
{
    for candidate in group.candidates() {
        match session.find_elements(candidate) {
            Ok(elements) => {
                let match_count = elements.len();
                if let Some(element) = elements.into_iter().next() {
                    debug!(%candidate, match_count, "selector matched");
                    return Some(Located {
                        element,
                        candidate: candidate.clone(),
                        match_count,
                    });
                }
            }
            Err(err) => {
                debug!(%candidate, error = %err, "selector lookup failed, trying next");
            }
        }
    }
    None
}
