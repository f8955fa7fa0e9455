use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use checkout_runner::artifacts::ArtifactDirs;
use checkout_runner::browser::{WebDriverOptions, WebDriverSession};
use checkout_runner::config::{self, ScenarioConfig};
use checkout_runner::export::read_orders;
use checkout_runner::report::{self, read_manifest};
use checkout_runner::runner::RunResult;
use checkout_runner::scenario::{self, Scenario};

/// Checkout Runner - storefront checkout and fulfillment automation
#[derive(Parser, Debug)]
#[command(
    name = "checkout-runner",
    about = "Drive a storefront checkout and back-office fulfillment over WebDriver and write HTML run reports",
    after_help = "ENVIRONMENT VARIABLES:\n\
        CHECKOUT_RUNNER_CONFIG               Scenario configuration file (TOML)\n\
        CHECKOUT_RUNNER_WEBDRIVER_URL        WebDriver endpoint\n\
        CHECKOUT_RUNNER_RESULTS_DIR          Artifact root directory\n\
        CHECKOUT_RUNNER_HEADLESS             Run the browser without a window\n\
        CHECKOUT_RUNNER_STOREFRONT_EMAIL     Storefront login\n\
        CHECKOUT_RUNNER_STOREFRONT_PASSWORD  Storefront password\n\
        CHECKOUT_RUNNER_BACKOFFICE_EMAIL     Back office login\n\
        CHECKOUT_RUNNER_BACKOFFICE_PASSWORD  Back office password\n\
        CHECKOUT_RUNNER_CARD_NUMBER          Payment test card\n\
        RUST_LOG                             Log filter (default: checkout_runner=info)"
)]
struct Args {
    /// Scenario configuration file (TOML)
    #[arg(long, global = true, env = "CHECKOUT_RUNNER_CONFIG")]
    config: Option<PathBuf>,

    /// WebDriver endpoint, e.g. a running chromedriver
    #[arg(long, global = true, env = "CHECKOUT_RUNNER_WEBDRIVER_URL")]
    webdriver_url: Option<String>,

    /// Directory for screenshots, reports and exports
    #[arg(long, global = true, env = "CHECKOUT_RUNNER_RESULTS_DIR")]
    results_dir: Option<PathBuf>,

    /// Run the browser without a visible window
    #[arg(long, global = true)]
    headless: bool,

    /// Print a JSON summary on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Buy one product on the storefront and export the order
    Storefront,

    /// Ship orders in the back office
    Fulfillment {
        /// Order number to ship (repeatable)
        #[arg(long, required_unless_present = "orders_csv")]
        order: Vec<String>,

        /// Ship every order of a hand-off CSV written by a storefront run
        #[arg(long, conflicts_with = "order")]
        orders_csv: Option<PathBuf>,
    },

    /// Storefront purchase followed by fulfillment of the new order
    Full,

    /// Re-render a report from a saved run manifest
    Render {
        /// Run manifest (`<report>.json`)
        manifest: PathBuf,

        /// Scenario the run belongs to
        #[arg(long, value_enum, default_value = "storefront")]
        scenario: ScenarioKind,

        /// Output file (default: manifest path with .html)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete reports and screenshots older than the given age
    Prune {
        #[arg(long, default_value = "7")]
        older_than_days: u64,
    },

    /// Print the effective configuration with secrets masked
    Config,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScenarioKind {
    Storefront,
    Fulfillment,
    Full,
}

impl ScenarioKind {
    fn scenario(self) -> Scenario {
        match self {
            ScenarioKind::Storefront => Scenario::Storefront,
            ScenarioKind::Fulfillment => Scenario::Fulfillment { orders: Vec::new() },
            ScenarioKind::Full => Scenario::Full,
        }
    }
}

/// Exit status for errors before any run starts
const EXIT_OPERATOR_ERROR: u8 = 2;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_OPERATOR_ERROR)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config::get().log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<ExitCode> {
    let runtime = config::get();
    let results_dir = args
        .results_dir
        .clone()
        .unwrap_or_else(|| runtime.results_dir.clone());
    let dirs = ArtifactDirs::new(results_dir);

    let config_path = args.config.clone().or_else(|| runtime.scenario_file.clone());
    let mut scenario_config = ScenarioConfig::load(config_path.as_deref())
        .context("Failed to load scenario configuration")?;
    scenario_config.apply_env_overrides();

    let scenario = match args.command {
        Commands::Storefront => Scenario::Storefront,
        Commands::Full => Scenario::Full,
        Commands::Fulfillment { order, orders_csv } => {
            let orders = match orders_csv {
                Some(path) => orders_from_csv(&path)?,
                None => order,
            };
            Scenario::Fulfillment { orders }
        }
        Commands::Render {
            manifest,
            scenario,
            output,
        } => {
            render_manifest(&manifest, scenario.scenario(), output, &scenario_config, args.json)?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Prune { older_than_days } => {
            let removed = dirs.prune(retention(older_than_days))?;
            if args.json {
                println!("{}", serde_json::json!({ "removed": removed }));
            } else {
                println!("Removed {} old artifact(s) from {}", removed, dirs.root().display());
            }
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Config => {
            print!("{}", scenario_config.to_masked_toml()?);
            return Ok(ExitCode::SUCCESS);
        }
    };

    let options = WebDriverOptions::new(args.webdriver_url.as_deref().unwrap_or(&runtime.webdriver_url))
        .headless(args.headless || runtime.headless)
        .page_load_timeout(Duration::from_millis(scenario_config.timeouts.page_load_ms));

    let run = scenario::execute(
        || WebDriverSession::connect(&options),
        &scenario_config,
        &dirs,
        &scenario,
    );
    let paths = match scenario::publish_report(&run, &scenario, &scenario_config, &dirs) {
        Ok(paths) => Some(paths),
        Err(e) => {
            error!(error = %e, "failed to write report");
            None
        }
    };
    let (report, latest) = match &paths {
        Some(paths) => (Some(paths.timestamped.as_path()), Some(paths.latest.as_path())),
        None => (None, None),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary(&run, &scenario, report, latest))?);
    } else {
        println!("{} {}", scenario.display_name(), run.status());
        println!("  Steps: {} ({} errors)", run.steps().len(), run.steps().error_count());
        if !run.order_id().is_empty() {
            println!("  Order: {}", run.order_id());
        }
        if !run.screenshot_path().is_empty() {
            println!("  Screenshot: {}", run.screenshot_path());
        }
        match (report, latest) {
            (Some(report), Some(latest)) => {
                println!("  Report: {}", report.display());
                println!("  Latest: {}", latest.display());
            }
            _ => println!("  Report: not written (see log)"),
        }
    }

    info!(status = %run.status(), "run complete");
    Ok(ExitCode::from(run_exit_status(&run)))
}

/// Exit status of a finished run; report publishing does not affect it
fn run_exit_status(run: &RunResult) -> u8 {
    if run.status().is_passed() { 0 } else { 1 }
}

/// Age limit for `prune`, saturating for absurd day counts
fn retention(days: u64) -> Duration {
    Duration::from_secs(days.saturating_mul(SECONDS_PER_DAY))
}

fn orders_from_csv(path: &Path) -> Result<Vec<String>> {
    let orders: Vec<String> = read_orders(path)?
        .into_iter()
        .map(|record| record.order_id)
        .collect();
    if orders.is_empty() {
        bail!("{} contains no orders", path.display());
    }
    Ok(orders)
}

fn render_manifest(
    manifest: &Path,
    scenario: Scenario,
    output: Option<PathBuf>,
    config: &ScenarioConfig,
    json: bool,
) -> Result<()> {
    let run = read_manifest(manifest)?;
    let html = report::render(&run, &scenario::report_context(&run, &scenario, config));
    let output = output.unwrap_or_else(|| manifest.with_extension("html"));
    std::fs::write(&output, html).with_context(|| format!("Failed to write {}", output.display()))?;

    if json {
        println!("{}", serde_json::json!({ "report": output, "status": run.status().to_string() }));
    } else {
        println!("Rendered {} ({})", output.display(), run.status());
    }
    Ok(())
}

fn summary(run: &RunResult, scenario: &Scenario, report: Option<&Path>, latest: Option<&Path>) -> serde_json::Value {
    serde_json::json!({
        "scenario": scenario.name(),
        "status": run.status().to_string(),
        "passed": run.status().is_passed(),
        "execution_time_ms": run.execution_time_ms(),
        "order_id": run.order_id(),
        "screenshot": run.screenshot_path(),
        "export": run.export_path(),
        "report": report,
        "latest_report": latest,
        "steps": run.steps().len(),
        "errors": run.steps().error_count(),
    })
}
