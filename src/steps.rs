//! Append-only log of what a run attempted and observed.
//!
//! Each [`Step`] is immutable once recorded. The [`StepLog`] only grows, and
//! every recorded step is mirrored as a `tracing` event at a level matching
//! its kind so progress is visible while the run is still going.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Display format for step timestamps (e.g. `02:15:07 PM`)
pub const STEP_TIME_FORMAT: &str = "%I:%M:%S %p";

/// Severity of a step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    #[default]
    Info,
    Warning,
    Error,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::Info => write!(f, "info"),
            StepKind::Warning => write!(f, "warning"),
            StepKind::Error => write!(f, "error"),
        }
    }
}

/// One observed event in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    icon: String,
    title: String,
    description: String,
    #[serde(default)]
    kind: StepKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    timestamp: String,
}

impl Step {
    /// Create a step stamped with the current local time
    pub fn new(
        icon: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        kind: StepKind,
        details: impl Into<String>,
    ) -> Self {
        let timestamp = Local::now().format(STEP_TIME_FORMAT).to_string();
        Self::with_timestamp(icon, title, description, kind, details, timestamp)
    }

    /// Create a step with an already formatted timestamp
    pub fn with_timestamp(
        icon: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        kind: StepKind,
        details: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        let details = details.into();
        Self {
            icon: icon.into(),
            title: title.into(),
            description: description.into(),
            kind,
            details: (!details.is_empty()).then_some(details),
            timestamp: timestamp.into(),
        }
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn is_error(&self) -> bool {
        self.kind == StepKind::Error
    }
}

/// Ordered, append-only record of steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepLog {
    steps: Vec<Step>,
}

impl StepLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new step and return it
    pub fn record(
        &mut self,
        icon: &str,
        title: &str,
        description: &str,
        kind: StepKind,
        details: &str,
    ) -> &Step {
        self.append(Step::new(icon, title, description, kind, details))
    }

    pub fn info(&mut self, icon: &str, title: &str, description: &str) -> &Step {
        self.record(icon, title, description, StepKind::Info, "")
    }

    pub fn warning(&mut self, icon: &str, title: &str, description: &str) -> &Step {
        self.record(icon, title, description, StepKind::Warning, "")
    }

    pub fn error(&mut self, icon: &str, title: &str, description: &str) -> &Step {
        self.record(icon, title, description, StepKind::Error, "")
    }

    /// Append an existing step (e.g. one with a fixed timestamp)
    pub fn append(&mut self, step: Step) -> &Step {
        mirror(&step);
        self.steps.push(step);
        &self.steps[self.steps.len() - 1]
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    pub fn error_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_error()).count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }
}

impl<'a> IntoIterator for &'a StepLog {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

fn mirror(step: &Step) {
    let details = step.details().unwrap_or_default();
    match step.kind() {
        StepKind::Info => tracing::info!(
            icon = step.icon(),
            title = step.title(),
            "{}", step.description()
        ),
        StepKind::Warning => tracing::warn!(
            icon = step.icon(),
            title = step.title(),
            "{}", step.description()
        ),
        StepKind::Error => tracing::error!(
            icon = step.icon(),
            title = step.title(),
            details,
            "{}", step.description()
        ),
    }
}
