//! Scenario driver.
//!
//! A scenario is one linear business flow against a single browser session.
//! [`ScenarioDriver::run`] executes it and always hands back a finished
//! [`RunResult`]: faults inside the flow are caught once at the top, recorded
//! as an error step, followed by an error screenshot and session teardown.
//!
//! ```no_run
//! use checkout_runner::artifacts::ArtifactDirs;
//! use checkout_runner::browser::{WebDriverOptions, WebDriverSession};
//! use checkout_runner::config::ScenarioConfig;
//! use checkout_runner::scenario::{Scenario, execute, publish_report};
//!
//! let config = ScenarioConfig::load(None).unwrap();
//! let dirs = ArtifactDirs::new("test-results");
//! let options = WebDriverOptions::new("http://localhost:9515");
//! let run = execute(|| WebDriverSession::connect(&options), &config, &dirs, &Scenario::Storefront);
//! publish_report(&run, &Scenario::Storefront, &config, &dirs).unwrap();
//! ```

mod flow;
pub mod fulfillment;
pub mod storefront;

pub use flow::Flow;

use std::fs;
use std::time::Instant;

use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::artifacts::{ArtifactDirs, ArtifactResult, capture_screenshot};
use crate::browser::{BrowserResult, BrowserSession, parse_user_agent};
use crate::config::ScenarioConfig;
use crate::interact::Interactor;
use crate::report::{self, ReportContext, ReportPaths, ReportWriter, screenshot_file_name};
use crate::runner::RunResult;
use crate::steps::StepKind;

/// Format of the report generation time
pub const REPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const STOREFRONT_VALIDATIONS: &[&str] = &[
    "Login with email and password",
    "Department navigation and category selection",
    "Product search with fallback selectors",
    "Resilient product selection",
    "Size selection and add to bag",
    "Checkout and delivery option",
    "Card payment and OTP challenge",
    "Order number capture and CSV export",
];

const FULFILLMENT_VALIDATIONS: &[&str] = &[
    "Back office login and tenant selection",
    "Order search",
    "Stock validation",
    "Packing slip and shipment preparation",
    "Shipping label and shipment completion",
];

const FULL_VALIDATIONS: &[&str] = &[
    "Login with email and password",
    "Product search with fallback selectors",
    "Checkout, payment and order number capture",
    "Order CSV export",
    "Back office fulfillment of the placed order",
];

/// The flows this crate knows how to drive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scenario {
    /// Buy one product on the storefront
    Storefront,
    /// Ship the given orders in the back office
    Fulfillment { orders: Vec<String> },
    /// Storefront purchase, then fulfillment of the new order
    Full,
}

impl Scenario {
    /// Short name, as used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Storefront => "storefront",
            Scenario::Fulfillment { .. } => "fulfillment",
            Scenario::Full => "full",
        }
    }

    /// Human readable name shown in the report
    pub fn display_name(&self) -> &'static str {
        match self {
            Scenario::Storefront => "Storefront Checkout",
            Scenario::Fulfillment { .. } => "Back Office Fulfillment",
            Scenario::Full => "Checkout and Fulfillment",
        }
    }

    /// Entry URL of the scenario
    pub fn target_url<'c>(&self, config: &'c ScenarioConfig) -> &'c str {
        match self {
            Scenario::Storefront | Scenario::Full => &config.storefront.base_url,
            Scenario::Fulfillment { .. } => &config.fulfillment.url,
        }
    }

    /// Checklist of what a passing run has exercised
    pub fn validations(&self) -> &'static [&'static str] {
        match self {
            Scenario::Storefront => STOREFRONT_VALIDATIONS,
            Scenario::Fulfillment { .. } => FULFILLMENT_VALIDATIONS,
            Scenario::Full => FULL_VALIDATIONS,
        }
    }
}

/// Runs scenarios against one session
pub struct ScenarioDriver<'a, S: BrowserSession + ?Sized> {
    session: &'a S,
    config: &'a ScenarioConfig,
    dirs: &'a ArtifactDirs,
    interactor: Interactor<S>,
}

impl<'a, S: BrowserSession + ?Sized> ScenarioDriver<'a, S> {
    pub fn new(session: &'a S, config: &'a ScenarioConfig, dirs: &'a ArtifactDirs) -> Self {
        Self::with_interactor(session, config, dirs, Interactor::new())
    }

    pub fn with_interactor(
        session: &'a S,
        config: &'a ScenarioConfig,
        dirs: &'a ArtifactDirs,
        interactor: Interactor<S>,
    ) -> Self {
        Self {
            session,
            config,
            dirs,
            interactor,
        }
    }

    /// Execute the scenario and quit the session
    pub fn run(&self, scenario: &Scenario) -> RunResult {
        let mut run = RunResult::new();
        run.info(
            "🚀",
            "Test Started",
            &format!("Starting {} automation", scenario.display_name()),
        );
        self.run_in(scenario, &mut run, Instant::now());
        run
    }

    /// Execute the scenario, appending to an existing run
    fn run_in(&self, scenario: &Scenario, run: &mut RunResult, started: Instant) {
        self.record_browser(run);

        match self.drive(scenario, run) {
            Ok(()) => {
                let title = self.session.title().unwrap_or_default();
                if let Ok(url) = self.session.current_url() {
                    run.set_page(title.as_str(), url.as_str());
                }
                run.info("📸", "Final Screenshot", "Capturing final page state");
                self.screenshot(run, &self.config.output.screenshot_prefix);
                run.info("🎯", "Test Completed", "Test execution finished");
            }
            Err(err) => {
                run.record(
                    "❌",
                    "Test Failed",
                    &format!("Error: {}", err),
                    StepKind::Error,
                    &format!("{:?}", err),
                );
                run.info("📸", "Error Screenshot", "Capturing page state after the failure");
                self.screenshot(run, &self.config.output.error_screenshot_prefix);
            }
        }

        match self.session.quit() {
            Ok(()) => {
                run.info("🔒", "Cleanup", "Browser closed successfully");
            }
            Err(err) => {
                run.error("❌", "Cleanup Error", &format!("Error closing browser: {}", err));
            }
        }

        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        run.set_execution_time_ms(elapsed);
        run.info(
            "⏱️",
            "Execution Time",
            &format!("Total execution time: {}ms", elapsed),
        );
        info!(scenario = scenario.name(), status = %run.status(), elapsed_ms = elapsed, "scenario finished");
    }

    fn record_browser(&self, run: &mut RunResult) {
        match self.session.user_agent() {
            Ok(user_agent) => {
                let (name, version) = parse_user_agent(&user_agent);
                run.set_browser(name, version);
            }
            Err(err) => warn!(error = %err, "could not read user agent"),
        }
    }

    fn drive(&self, scenario: &Scenario, run: &mut RunResult) -> Result<()> {
        let mut flow = Flow::new(self.session, self.config, &self.interactor, run);
        match scenario {
            Scenario::Storefront => {
                storefront::run(&mut flow, self.dirs)?;
            }
            Scenario::Fulfillment { orders } => {
                if orders.is_empty() {
                    bail!("No orders given for fulfillment");
                }
                fulfillment::run(&mut flow, orders)?;
            }
            Scenario::Full => match storefront::run(&mut flow, self.dirs)? {
                Some(order) => fulfillment::run(&mut flow, &[order])?,
                None => flow.warn(
                    "⚠️",
                    "Fulfillment Skipped",
                    "No order number was captured, skipping back office fulfillment",
                ),
            },
        }
        Ok(())
    }

    /// Best-effort screenshot; a failure is only a warning
    fn screenshot(&self, run: &mut RunResult, prefix: &str) {
        match capture_screenshot(self.session, self.dirs, prefix) {
            Ok(shot) => {
                run.set_screenshot_path(shot.path.display().to_string());
                run.info(
                    "✅",
                    "Screenshot Saved",
                    &format!("Screenshot saved: {} ({}x{})", shot.file_name(), shot.width, shot.height),
                );
            }
            Err(err) => {
                warn!(error = %err, "screenshot failed");
                run.warning("⚠️", "Screenshot Failed", &format!("Could not capture screenshot: {}", err));
            }
        }
    }
}

/// Open a session with `connect` and run the scenario on it.
///
/// A failed connection is recorded like any other fatal fault, so the caller
/// always gets a reportable run.
pub fn execute<S, F>(connect: F, config: &ScenarioConfig, dirs: &ArtifactDirs, scenario: &Scenario) -> RunResult
where
    S: BrowserSession,
    F: FnOnce() -> BrowserResult<S>,
{
    let started = Instant::now();
    let mut run = RunResult::new();
    run.info(
        "🚀",
        "Test Started",
        &format!("Starting {} automation", scenario.display_name()),
    );

    if let Err(err) = dirs.init() {
        warn!(error = %err, "could not create artifact directories");
        run.warning("⚠️", "Artifact Setup", &format!("Could not create artifact directories: {}", err));
    }

    run.info("⚙️", "Browser Setup", "Connecting to the WebDriver endpoint");
    let session = match connect() {
        Ok(session) => session,
        Err(err) => {
            run.record(
                "❌",
                "Test Failed",
                &format!("Error: {}", err),
                StepKind::Error,
                &format!("{:?}", err),
            );
            let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            run.set_execution_time_ms(elapsed);
            return run;
        }
    };
    run.info("✅", "WebDriver Ready", "Browser session established");

    ScenarioDriver::new(&session, config, dirs).run_in(scenario, &mut run, started);
    run
}

/// Report metadata for a finished run
pub fn report_context(run: &RunResult, scenario: &Scenario, config: &ScenarioConfig) -> ReportContext {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut ctx = ReportContext::new(config.report_title(), scenario.display_name())
        .target_url(scenario.target_url(config))
        .generated_at(chrono::Local::now().format(REPORT_TIME_FORMAT).to_string())
        .host(host)
        .validations(scenario.validations().iter().copied());

    let name = screenshot_file_name(run);
    if !name.is_empty() {
        ctx = ctx.screenshot_href(format!("../screenshots/{}", name));
        if config.output.inline_screenshot {
            match fs::read(run.screenshot_path()) {
                Ok(png) => ctx = ctx.screenshot_png(png),
                Err(err) => warn!(path = run.screenshot_path(), error = %err, "screenshot not embedded"),
            }
        }
    }
    ctx
}

/// Render the run and write it to the reports directory
pub fn publish_report(
    run: &RunResult,
    scenario: &Scenario,
    config: &ScenarioConfig,
    dirs: &ArtifactDirs,
) -> ArtifactResult<ReportPaths> {
    let html = report::render(run, &report_context(run, scenario, config));
    ReportWriter::new(dirs.reports(), &config.output.report_prefix).write(&html, run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::MockBrowser;
    use crate::runner::RunStatus;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn titles(run: &RunResult) -> Vec<&str> {
        run.steps().iter().map(|s| s.title()).collect()
    }

    #[test]
    fn test_scenario_names() {
        assert_eq!(Scenario::Storefront.name(), "storefront");
        assert_eq!(Scenario::Fulfillment { orders: vec![] }.name(), "fulfillment");
        assert_eq!(Scenario::Full.name(), "full");
        assert!(!Scenario::Full.validations().is_empty());
    }

    #[test]
    fn test_target_url_follows_scenario() {
        let mut config = ScenarioConfig::default();
        config.storefront.base_url = "https://shop.example".to_string();
        config.fulfillment.url = "https://backoffice.example".to_string();

        assert_eq!(Scenario::Storefront.target_url(&config), "https://shop.example");
        assert_eq!(Scenario::Full.target_url(&config), "https://shop.example");
        assert_eq!(
            Scenario::Fulfillment { orders: vec!["1".into()] }.target_url(&config),
            "https://backoffice.example"
        );
    }

    #[test]
    fn test_missing_configuration_fails_run_with_teardown() {
        let tmp = TempDir::new().unwrap();
        let dirs = ArtifactDirs::new(tmp.path());
        let config = ScenarioConfig::default();
        let browser = MockBrowser::permissive();

        let run = ScenarioDriver::new(&browser, &config, &dirs).run(&Scenario::Storefront);

        assert_eq!(run.status(), RunStatus::Failed);
        let failed = run.steps().iter().find(|s| s.title() == "Test Failed").unwrap();
        assert!(failed.description().contains("storefront.base_url"));
        assert!(titles(&run).contains(&"Error Screenshot"));
        assert!(titles(&run).contains(&"Cleanup"));
        assert_eq!(run.steps().last().unwrap().title(), "Execution Time");
        assert!(browser.is_closed());
        assert!(run.screenshot_path().contains("checkout-error-"));
    }

    #[test]
    fn test_fulfillment_without_orders_fails() {
        let tmp = TempDir::new().unwrap();
        let dirs = ArtifactDirs::new(tmp.path());
        let config = ScenarioConfig::default();
        let browser = MockBrowser::permissive();

        let run = ScenarioDriver::new(&browser, &config, &dirs)
            .run(&Scenario::Fulfillment { orders: Vec::new() });
        assert_eq!(run.status(), RunStatus::Failed);
    }

    #[test]
    fn test_connect_failure_is_recorded() {
        let tmp = TempDir::new().unwrap();
        let dirs = ArtifactDirs::new(tmp.path());
        let config = ScenarioConfig::default();

        let run = execute(
            || -> BrowserResult<MockBrowser> { Err(crate::browser::BrowserError::driver("connection refused")) },
            &config,
            &dirs,
            &Scenario::Storefront,
        );

        assert_eq!(run.status(), RunStatus::Failed);
        assert_eq!(titles(&run), vec!["Test Started", "Browser Setup", "Test Failed"]);
        assert!(dirs.reports().is_dir());
    }

    #[test]
    fn test_report_context_links_screenshot() {
        let mut run = RunResult::new();
        run.set_screenshot_path("/results/screenshots/checkout-run-2026-10-18T09-00-00.png");
        let config = ScenarioConfig::default();

        let ctx = report_context(&run, &Scenario::Storefront, &config);
        assert_eq!(
            ctx.screenshot_href.as_deref(),
            Some("../screenshots/checkout-run-2026-10-18T09-00-00.png")
        );
        assert_eq!(ctx.test_name, "Storefront Checkout");
        assert!(ctx.screenshot_png.is_none());
    }
}
