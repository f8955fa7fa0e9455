//! Checkout Runner - resilient browser automation of a storefront checkout.
//!
//! This crate provides:
//! - Fallback element location over ordered selector groups
//! - Click fallback (native, script, pointer) with every attempt recorded
//! - An append-only step log mirrored to `tracing`
//! - Self-contained HTML reports with screenshot, steps and run summary
//! - Storefront and back-office fulfillment scenarios over WebDriver
//! - MockBrowser for testing without a browser
//!
//! # Example
//!
//! ```rust,no_run
//! use checkout_runner::browser::{WebDriverOptions, WebDriverSession};
//! use checkout_runner::{ArtifactDirs, Scenario, ScenarioConfig, execute, publish_report};
//!
//! let config = ScenarioConfig::load(Some(std::path::Path::new("checkout.toml"))).unwrap();
//! let dirs = ArtifactDirs::new("test-results");
//! let options = WebDriverOptions::new("http://localhost:9515").headless(true);
//!
//! let run = execute(|| WebDriverSession::connect(&options), &config, &dirs, &Scenario::Storefront);
//! let paths = publish_report(&run, &Scenario::Storefront, &config, &dirs).unwrap();
//! println!("{} -> {}", run.status(), paths.latest.display());
//! ```

pub mod artifacts;
pub mod browser;
pub mod config;
pub mod export;
pub mod interact;
pub mod locate;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod steps;
pub mod wait;

// Re-export the browser seam
pub use browser::{
    BrowserError, BrowserResult, BrowserSession, MockBrowser, SelectorCandidate, SelectorGroup,
};

// Re-export the resilient core
pub use interact::{ClickStrategy, Interactor};
pub use locate::{Located, locate, locate_detailed};
pub use steps::{Step, StepKind, StepLog};
pub use runner::{RunResult, RunStatus};
pub use wait::{WaitError, Waiter};

// Re-export reporting and artifacts
pub use artifacts::{ArtifactDirs, ArtifactError, ArtifactResult};
pub use export::{OrderRecord, append_order, read_orders};
pub use report::{ReportContext, ReportPaths, ReportWriter, render};

// Re-export scenarios and configuration
pub use config::{ConfigError, ConfigResult, ScenarioConfig};
pub use scenario::{Scenario, ScenarioDriver, execute, publish_report, report_context};
