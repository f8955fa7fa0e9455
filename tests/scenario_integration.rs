//! End-to-end scenario runs against the mock browser.

use checkout_runner::browser::{ClickMethod, MockBrowser};
use checkout_runner::config::{Credentials, DeliveryAddress, ScenarioConfig, Timeouts};
use checkout_runner::export::read_orders;
use checkout_runner::report::{STATUS_FAILED, STATUS_PASSED};
use checkout_runner::scenario::{Scenario, ScenarioDriver, publish_report};
use checkout_runner::{ArtifactDirs, RunResult, RunStatus, StepKind};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

const SHOP_URL: &str = "https://shop.example/";
const ORDER_ID: &str = "xpath:(//span[contains(@class,'body-lg-bold')])[1]";
const LOGIN_BUTTON: &str = "xpath://button[contains(text(),'Log in')]";
const CHECKOUT_BUTTON: &str = "xpath://button[contains(text(),'Checkout')]";
const QUANTITY: &str =
    "xpath://span[contains(text(),'Quantity')]/following-sibling::div[contains(@class,'inserted')]";
const ORDER_SEARCH: &str = "xpath:(//input[contains(@name,'inputEl')])[2]";
const STOCK_INPUT: &str = "xpath://input[@placeholder='Current Stock Amount']";

fn config() -> ScenarioConfig {
    let mut config = ScenarioConfig::default();
    config.storefront.base_url = SHOP_URL.to_string();
    config.storefront.credentials = Credentials::new("shopper@example.com", "storefront-secret");
    config.fulfillment.url = "https://backoffice.example/".to_string();
    config.fulfillment.credentials = Credentials::new("ops@example.com", "backoffice-secret");
    config.fulfillment.tenant = "Main Warehouse".to_string();
    config.timeouts = Timeouts {
        element_wait_ms: 100,
        page_load_ms: 100,
        poll_interval_ms: 5,
    };
    config
}

/// Permissive browser that shows an order number on the confirmation page
fn shop() -> MockBrowser {
    MockBrowser::permissive()
        .with_page(SHOP_URL, "Shop Home")
        .with_text(ORDER_ID, " 31544 ")
}

fn titles(run: &RunResult) -> Vec<&str> {
    run.steps().iter().map(|s| s.title()).collect()
}

fn step<'a>(run: &'a RunResult, title: &str) -> &'a checkout_runner::Step {
    run.steps()
        .iter()
        .find(|s| s.title() == title)
        .unwrap_or_else(|| panic!("no step titled {:?} in {:?}", title, titles(run)))
}

#[test]
fn test_storefront_run_passes_and_exports_order() {
    let tmp = TempDir::new().unwrap();
    let dirs = ArtifactDirs::new(tmp.path());
    let config = config();
    let browser = shop();

    let run = ScenarioDriver::new(&browser, &config, &dirs).run(&Scenario::Storefront);

    assert_eq!(run.status(), RunStatus::Passed, "steps: {:?}", titles(&run));
    assert_eq!(run.order_id(), "31544");
    assert_eq!(run.product_title(), "Shop Home");
    assert_eq!(run.browser_name(), "Chrome");
    assert_eq!(run.steps().iter().next().unwrap().title(), "Test Started");
    assert_eq!(run.steps().last().unwrap().title(), "Execution Time");

    let t = titles(&run);
    for expected in [
        "Page Loaded",
        "Login",
        "Product Found",
        "Product Located",
        "Product Page",
        "Add to Bag Success",
        "Order Placed",
        "CSV Export",
        "Final Screenshot",
        "Screenshot Saved",
        "Test Completed",
        "Cleanup",
    ] {
        assert!(t.contains(&expected), "missing {:?} in {:?}", expected, t);
    }
    assert_eq!(
        step(&run, "Product Found").description(),
        "Found 1 products using selector: class:plp-card"
    );

    // Payment data went into the form, and the iframe was left again
    assert!(
        browser
            .typed()
            .contains(&("name:cardNumber".to_string(), "4111111111111111".to_string()))
    );
    assert_eq!(browser.current_frame(), None);
    assert!(browser.is_closed());

    let orders = read_orders(&dirs.exports().join("orders.csv")).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order_id, "31544");
    assert_eq!(orders[0].product_url, SHOP_URL);
    assert!(run.export_path().ends_with("orders.csv"));

    assert!(run.screenshot_path().contains("checkout-run-"));
    assert!(fs::metadata(run.screenshot_path()).unwrap().len() > 0);

    let paths = publish_report(&run, &Scenario::Storefront, &config, &dirs).unwrap();
    let html = fs::read_to_string(&paths.latest).unwrap();
    assert!(html.contains(STATUS_PASSED));
    assert!(html.contains("31544"));
    assert!(html.contains("../screenshots/checkout-run-"));
    assert_eq!(fs::read_to_string(&paths.timestamped).unwrap(), html);
}

#[test]
fn test_login_failure_produces_failed_report() {
    let tmp = TempDir::new().unwrap();
    let dirs = ArtifactDirs::new(tmp.path());
    let config = config();
    let browser = shop().with_missing(LOGIN_BUTTON);

    let run = ScenarioDriver::new(&browser, &config, &dirs).run(&Scenario::Storefront);

    assert_eq!(run.status(), RunStatus::Failed);
    let failed = step(&run, "Test Failed");
    assert_eq!(failed.kind(), StepKind::Error);
    assert_eq!(failed.description(), "Error: Login Submitted is not clickable");
    assert!(failed.details().unwrap().contains("Timed out"));

    assert!(titles(&run).contains(&"Error Screenshot"));
    assert!(!titles(&run).contains(&"Test Completed"));
    assert!(run.screenshot_path().contains("checkout-error-"));
    assert!(run.order_id().is_empty());
    assert!(!dirs.exports().join("orders.csv").exists());
    assert!(browser.is_closed());

    let paths = publish_report(&run, &Scenario::Storefront, &config, &dirs).unwrap();
    let html = fs::read_to_string(&paths.latest).unwrap();
    assert!(html.contains(STATUS_FAILED));
    assert!(html.contains("Login Submitted is not clickable"));
}

#[test]
fn test_product_found_through_fallback_selectors() {
    let tmp = TempDir::new().unwrap();
    let dirs = ArtifactDirs::new(tmp.path());
    let config = config();
    let browser = shop().with_missing("class:plp-card");

    let run = ScenarioDriver::new(&browser, &config, &dirs).run(&Scenario::Storefront);

    assert_eq!(run.status(), RunStatus::Passed, "steps: {:?}", titles(&run));
    assert_eq!(step(&run, "Specific Class Search").kind(), StepKind::Warning);
    assert!(titles(&run).contains(&"Fallback Search"));
    assert_eq!(
        step(&run, "Product Found").description(),
        "Found 1 products using selector: css:.product-item"
    );
    assert!(!titles(&run).contains(&"Further Scroll"));
}

#[test]
fn test_product_found_after_further_scroll() {
    let tmp = TempDir::new().unwrap();
    let dirs = ArtifactDirs::new(tmp.path());
    let config = config();
    let browser = config
        .storefront
        .selectors
        .product_fallback
        .candidates()
        .iter()
        .fold(shop().with_missing("class:plp-card"), |b, c| {
            b.with_missing(&c.to_string())
        });

    let run = ScenarioDriver::new(&browser, &config, &dirs).run(&Scenario::Storefront);

    assert_eq!(run.status(), RunStatus::Passed, "steps: {:?}", titles(&run));
    assert!(titles(&run).contains(&"Further Scroll"));
    assert_eq!(
        step(&run, "Product Found").description(),
        "Found 1 products using selector: xpath://a[contains(@href, '/product')]"
    );
}

#[test]
fn test_no_products_fails_without_exception() {
    let tmp = TempDir::new().unwrap();
    let dirs = ArtifactDirs::new(tmp.path());
    let config = config();
    let selectors = &config.storefront.selectors;
    let browser = selectors
        .product_fallback
        .candidates()
        .iter()
        .chain(selectors.product_xpath.candidates())
        .fold(shop().with_missing("class:plp-card"), |b, c| {
            b.with_missing(&c.to_string())
        });

    let run = ScenarioDriver::new(&browser, &config, &dirs).run(&Scenario::Storefront);

    assert_eq!(run.status(), RunStatus::Failed);
    assert_eq!(step(&run, "No Products Found").kind(), StepKind::Error);
    assert!(!titles(&run).contains(&"Test Failed"));
    assert!(!titles(&run).contains(&"Add to Bag Success"));
    assert!(titles(&run).contains(&"Cleanup"));
}

#[test]
fn test_product_click_falls_back_to_script() {
    let tmp = TempDir::new().unwrap();
    let dirs = ArtifactDirs::new(tmp.path());
    let config = config();
    let browser = shop().with_click_fault("class:plp-card", ClickMethod::Native);

    let run = ScenarioDriver::new(&browser, &config, &dirs).run(&Scenario::Storefront);

    assert_eq!(run.status(), RunStatus::Passed, "steps: {:?}", titles(&run));
    let fallback = step(&run, "Click Fallback");
    assert_eq!(fallback.kind(), StepKind::Warning);
    assert!(fallback.description().starts_with("direct click failed"));
    assert_eq!(
        step(&run, "Product Selected").description(),
        "Successfully clicked (JavaScript method)"
    );
}

#[test]
fn test_checkout_error_is_recorded_and_stops_run() {
    let tmp = TempDir::new().unwrap();
    let dirs = ArtifactDirs::new(tmp.path());
    let config = config();
    let browser = shop().with_missing(CHECKOUT_BUTTON);

    let run = ScenarioDriver::new(&browser, &config, &dirs).run(&Scenario::Storefront);

    assert_eq!(run.status(), RunStatus::Failed);
    let error = step(&run, "Checkout Flow Error");
    assert_eq!(error.description(), "Checkout flow failed: Checkout is not clickable");
    assert!(!titles(&run).contains(&"Payment Flow"));
    assert!(run.order_id().is_empty());
}

#[test]
fn test_delivery_address_fields_are_best_effort() {
    let tmp = TempDir::new().unwrap();
    let dirs = ArtifactDirs::new(tmp.path());
    let mut config = config();
    config.storefront.delivery_address = Some(DeliveryAddress {
        first_name: "Ada".to_string(),
        phone: "0501234567".to_string(),
        ..DeliveryAddress::default()
    });
    let browser = shop().with_hidden("css:input[name*='phone']");

    let run = ScenarioDriver::new(&browser, &config, &dirs).run(&Scenario::Storefront);

    assert_eq!(run.status(), RunStatus::Passed, "steps: {:?}", titles(&run));
    assert!(titles(&run).contains(&"Field Filled: First Name"));
    assert_eq!(step(&run, "Field Skipped: Phone").kind(), StepKind::Warning);
    assert!(!titles(&run).contains(&"Field Filled: City"));
    assert!(
        browser
            .typed()
            .contains(&("css:input[name*='firstName']".to_string(), "Ada".to_string()))
    );
}

#[test]
fn test_address_field_typed_when_clear_fails() {
    let tmp = TempDir::new().unwrap();
    let dirs = ArtifactDirs::new(tmp.path());
    let mut config = config();
    config.storefront.delivery_address = Some(DeliveryAddress {
        first_name: "Ada".to_string(),
        ..DeliveryAddress::default()
    });
    let browser = shop().with_clear_fault("css:input[name*='firstName']");

    let run = ScenarioDriver::new(&browser, &config, &dirs).run(&Scenario::Storefront);

    assert_eq!(run.status(), RunStatus::Passed, "steps: {:?}", titles(&run));
    assert_eq!(step(&run, "Field Filled: First Name").kind(), StepKind::Info);
    assert!(
        browser
            .typed()
            .contains(&("css:input[name*='firstName']".to_string(), "Ada".to_string()))
    );
}

#[test]
fn test_fulfillment_ships_each_order() {
    let tmp = TempDir::new().unwrap();
    let dirs = ArtifactDirs::new(tmp.path());
    let config = config();
    let browser = MockBrowser::permissive().with_text(QUANTITY, "2");
    let scenario = Scenario::Fulfillment {
        orders: vec!["31544".to_string(), "31545".to_string()],
    };

    let run = ScenarioDriver::new(&browser, &config, &dirs).run(&scenario);

    assert_eq!(run.status(), RunStatus::Passed, "steps: {:?}", titles(&run));
    let shipped = run
        .steps()
        .iter()
        .filter(|s| s.title() == "Fulfillment Complete")
        .count();
    assert_eq!(shipped, 2);

    let typed = browser.typed();
    assert!(typed.contains(&(ORDER_SEARCH.to_string(), "31544".to_string())));
    assert!(typed.contains(&(ORDER_SEARCH.to_string(), "31545".to_string())));
    assert!(typed.contains(&(STOCK_INPUT.to_string(), "2".to_string())));
    assert!(typed.contains(&("xpath://input[@placeholder='Weight']".to_string(), "12".to_string())));
}

#[test]
fn test_fulfillment_without_quantity_fails() {
    let tmp = TempDir::new().unwrap();
    let dirs = ArtifactDirs::new(tmp.path());
    let config = config();
    let browser = MockBrowser::permissive();
    let scenario = Scenario::Fulfillment {
        orders: vec!["31544".to_string()],
    };

    let run = ScenarioDriver::new(&browser, &config, &dirs).run(&scenario);

    assert_eq!(run.status(), RunStatus::Failed);
    assert_eq!(
        step(&run, "Test Failed").description(),
        "Error: Fulfillment of order 31544 failed"
    );
    assert!(step(&run, "Test Failed").details().unwrap().contains("no quantity"));
}

#[test]
fn test_full_scenario_hands_order_to_fulfillment() {
    let tmp = TempDir::new().unwrap();
    let dirs = ArtifactDirs::new(tmp.path());
    let config = config();
    let browser = shop().with_text(QUANTITY, "1");

    let run = ScenarioDriver::new(&browser, &config, &dirs).run(&Scenario::Full);

    assert_eq!(run.status(), RunStatus::Passed, "steps: {:?}", titles(&run));
    assert_eq!(run.order_id(), "31544");
    assert!(titles(&run).contains(&"CSV Export"));
    assert!(
        step(&run, "Fulfillment Complete")
            .description()
            .starts_with("Order 31544 shipped")
    );
    assert!(
        browser
            .typed()
            .contains(&(ORDER_SEARCH.to_string(), "31544".to_string()))
    );
}

#[test]
fn test_full_scenario_skips_fulfillment_without_order() {
    let tmp = TempDir::new().unwrap();
    let dirs = ArtifactDirs::new(tmp.path());
    let config = config();
    let browser = shop().with_missing(CHECKOUT_BUTTON);

    let run = ScenarioDriver::new(&browser, &config, &dirs).run(&Scenario::Full);

    assert_eq!(run.status(), RunStatus::Failed);
    assert_eq!(step(&run, "Fulfillment Skipped").kind(), StepKind::Warning);
    assert!(!titles(&run).contains(&"Fulfillment"));
}
