//! Types for run results.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::steps::{Step, StepKind, StepLog};

/// Overall outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Passed,
    Failed,
}

impl RunStatus {
    /// FAILED if any step is an error, PASSED otherwise
    pub fn from_steps<'a>(steps: impl IntoIterator<Item = &'a Step>) -> Self {
        if steps.into_iter().any(Step::is_error) {
            RunStatus::Failed
        } else {
            RunStatus::Passed
        }
    }

    pub fn is_passed(&self) -> bool {
        *self == RunStatus::Passed
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Passed => write!(f, "PASSED"),
            RunStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Record of one complete run
///
/// Steps only grow. The summary fields are set at fixed points of the run
/// (page load, product page, order confirmation, final screenshot, completion).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Ordered narrative of the run
    steps: StepLog,

    /// Last observed page title
    #[serde(default)]
    page_title: String,

    /// Last observed page URL
    #[serde(default)]
    final_url: String,

    /// Screenshot artifact, empty when none was captured
    #[serde(default)]
    screenshot_path: String,

    /// Wall-clock duration of the whole run
    #[serde(default)]
    execution_time_ms: u64,

    #[serde(default)]
    product_title: String,

    #[serde(default)]
    product_url: String,

    /// Order number captured on the confirmation page
    #[serde(default)]
    order_id: String,

    /// Order hand-off CSV written by this run
    #[serde(default)]
    export_path: String,

    #[serde(default)]
    browser_name: String,

    #[serde(default)]
    browser_version: String,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a step (see [`StepLog::record`])
    pub fn record(
        &mut self,
        icon: &str,
        title: &str,
        description: &str,
        kind: StepKind,
        details: &str,
    ) -> &Step {
        self.steps.record(icon, title, description, kind, details)
    }

    pub fn info(&mut self, icon: &str, title: &str, description: &str) -> &Step {
        self.steps.info(icon, title, description)
    }

    pub fn warning(&mut self, icon: &str, title: &str, description: &str) -> &Step {
        self.steps.warning(icon, title, description)
    }

    pub fn error(&mut self, icon: &str, title: &str, description: &str) -> &Step {
        self.steps.error(icon, title, description)
    }

    pub fn append(&mut self, step: Step) -> &Step {
        self.steps.append(step)
    }

    /// Mutable access to the log, for components that record steps themselves
    pub fn log_mut(&mut self) -> &mut StepLog {
        &mut self.steps
    }

    pub fn steps(&self) -> &StepLog {
        &self.steps
    }

    pub fn status(&self) -> RunStatus {
        RunStatus::from_steps(&self.steps)
    }

    pub fn set_page(&mut self, title: impl Into<String>, url: impl Into<String>) {
        self.page_title = title.into();
        self.final_url = url.into();
    }

    pub fn set_screenshot_path(&mut self, path: impl Into<String>) {
        self.screenshot_path = path.into();
    }

    pub fn set_execution_time_ms(&mut self, ms: u64) {
        self.execution_time_ms = ms;
    }

    pub fn set_product(&mut self, title: impl Into<String>, url: impl Into<String>) {
        self.product_title = title.into();
        self.product_url = url.into();
    }

    pub fn set_order_id(&mut self, order_id: impl Into<String>) {
        self.order_id = order_id.into();
    }

    pub fn set_export_path(&mut self, path: impl Into<String>) {
        self.export_path = path.into();
    }

    pub fn set_browser(&mut self, name: impl Into<String>, version: impl Into<String>) {
        self.browser_name = name.into();
        self.browser_version = version.into();
    }

    pub fn page_title(&self) -> &str {
        &self.page_title
    }

    pub fn final_url(&self) -> &str {
        &self.final_url
    }

    pub fn screenshot_path(&self) -> &str {
        &self.screenshot_path
    }

    pub fn execution_time_ms(&self) -> u64 {
        self.execution_time_ms
    }

    pub fn product_title(&self) -> &str {
        &self.product_title
    }

    pub fn product_url(&self) -> &str {
        &self.product_url
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn export_path(&self) -> &str {
        &self.export_path
    }

    pub fn browser_name(&self) -> &str {
        &self.browser_name
    }

    pub fn browser_version(&self) -> &str {
        &self.browser_version
    }
}
