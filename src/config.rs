//! Configuration management with environment variable support.
//!
//! Two layers:
//! - [`Config`]: process-wide runtime settings read once from the environment
//!   (WebDriver endpoint, results directory, headless flag, log filter).
//! - [`ScenarioConfig`]: everything a scenario needs to know about the sites it
//!   drives (URLs, credentials, payment test data, timeouts, selectors). It is
//!   loaded from a TOML file, then secrets are overlaid from the environment.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `CHECKOUT_RUNNER_CONFIG` | Scenario TOML file | none (built-in defaults) |
//! | `CHECKOUT_RUNNER_WEBDRIVER_URL` | WebDriver server | `http://localhost:9515` |
//! | `CHECKOUT_RUNNER_RESULTS_DIR` | Artifact root | `test-results` |
//! | `CHECKOUT_RUNNER_HEADLESS` | Run the browser headless | `false` |
//! | `CHECKOUT_RUNNER_LOG` | Log filter when `RUST_LOG` is unset | `checkout_runner=info` |
//! | `CHECKOUT_RUNNER_STOREFRONT_EMAIL` | Storefront login | none |
//! | `CHECKOUT_RUNNER_STOREFRONT_PASSWORD` | Storefront password | none |
//! | `CHECKOUT_RUNNER_BACKOFFICE_EMAIL` | Back-office login | none |
//! | `CHECKOUT_RUNNER_BACKOFFICE_PASSWORD` | Back-office password | none |
//! | `CHECKOUT_RUNNER_CARD_NUMBER` | Payment card number | public test card |
//!
//! # Example
//!
//! ```bash
//! export CHECKOUT_RUNNER_STOREFRONT_EMAIL="qa@example.com"
//! export CHECKOUT_RUNNER_STOREFRONT_PASSWORD="..."
//! checkout-runner --config uat.toml storefront
//! ```

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::browser::{SelectorCandidate, SelectorGroup};
use crate::wait::Waiter;

// ============================================================================
// Default Values
// ============================================================================

/// Default WebDriver server (chromedriver's default port)
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Default artifact root, relative to the working directory
pub const DEFAULT_RESULTS_DIR: &str = "test-results";

/// Default headless flag
pub const DEFAULT_HEADLESS: bool = false;

/// Default tracing filter
pub const DEFAULT_LOG_FILTER: &str = "checkout_runner=info";

/// Default element wait (milliseconds)
pub const DEFAULT_ELEMENT_WAIT_MS: u64 = 10_000;

/// Default page load wait (milliseconds)
pub const DEFAULT_PAGE_LOAD_MS: u64 = 15_000;

/// Default polling interval for waits (milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

pub const DEFAULT_REPORT_TITLE: &str = "Checkout Automation Report";
pub const DEFAULT_SCREENSHOT_PREFIX: &str = "checkout-run";
pub const DEFAULT_ERROR_SCREENSHOT_PREFIX: &str = "checkout-error";
pub const DEFAULT_REPORT_PREFIX: &str = "checkout-report";
pub const DEFAULT_ORDERS_CSV: &str = "orders.csv";

/// Name of the hosted payment form iframe
pub const DEFAULT_PAYMENT_FRAME: &str = "pgw-ui-container-dropin-iframe";

/// Public test card accepted by payment sandboxes
pub const DEFAULT_TEST_CARD: &str = "4111111111111111";

/// Replacement text for secrets in printed configuration
pub const MASK: &str = "********";

// ============================================================================
// Environment Variable Names
// ============================================================================

pub const ENV_CONFIG: &str = "CHECKOUT_RUNNER_CONFIG";
pub const ENV_WEBDRIVER_URL: &str = "CHECKOUT_RUNNER_WEBDRIVER_URL";
pub const ENV_RESULTS_DIR: &str = "CHECKOUT_RUNNER_RESULTS_DIR";
pub const ENV_HEADLESS: &str = "CHECKOUT_RUNNER_HEADLESS";
pub const ENV_LOG: &str = "CHECKOUT_RUNNER_LOG";
pub const ENV_STOREFRONT_EMAIL: &str = "CHECKOUT_RUNNER_STOREFRONT_EMAIL";
pub const ENV_STOREFRONT_PASSWORD: &str = "CHECKOUT_RUNNER_STOREFRONT_PASSWORD";
pub const ENV_BACKOFFICE_EMAIL: &str = "CHECKOUT_RUNNER_BACKOFFICE_EMAIL";
pub const ENV_BACKOFFICE_PASSWORD: &str = "CHECKOUT_RUNNER_BACKOFFICE_PASSWORD";
pub const ENV_CARD_NUMBER: &str = "CHECKOUT_RUNNER_CARD_NUMBER";

// ============================================================================
// Errors
// ============================================================================

/// Result type for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Missing configuration value: {0}")]
    Missing(&'static str),
}

// ============================================================================
// Runtime Configuration
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Process-wide runtime settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub webdriver_url: String,
    pub results_dir: PathBuf,
    pub headless: bool,
    pub log_filter: String,
    /// Scenario file, if one was configured
    pub scenario_file: Option<PathBuf>,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self::from_lookup(|_| None)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            webdriver_url: lookup(ENV_WEBDRIVER_URL).unwrap_or_else(|| DEFAULT_WEBDRIVER_URL.to_string()),
            results_dir: lookup(ENV_RESULTS_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_DIR)),
            headless: lookup(ENV_HEADLESS)
                .and_then(|s| parse_flag(&s))
                .unwrap_or(DEFAULT_HEADLESS),
            log_filter: lookup(ENV_LOG).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            scenario_file: lookup(ENV_CONFIG).map(PathBuf::from),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Scenario Configuration
// ============================================================================

/// Everything the scenarios need about the sites they drive
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub report_title: String,
    pub timeouts: Timeouts,
    pub output: OutputSettings,
    pub storefront: StorefrontSettings,
    pub payment: PaymentSettings,
    pub fulfillment: FulfillmentSettings,
}

/// Wait budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub element_wait_ms: u64,
    pub page_load_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            element_wait_ms: DEFAULT_ELEMENT_WAIT_MS,
            page_load_ms: DEFAULT_PAGE_LOAD_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Timeouts {
    /// Waiter for element conditions
    pub fn element_waiter(&self) -> Waiter {
        Waiter::new(
            Duration::from_millis(self.element_wait_ms),
            Duration::from_millis(self.poll_interval_ms),
        )
    }

    /// Waiter for page readiness
    pub fn page_waiter(&self) -> Waiter {
        Waiter::new(
            Duration::from_millis(self.page_load_ms),
            Duration::from_millis(self.poll_interval_ms),
        )
    }
}

/// Artifact naming and report options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub screenshot_prefix: String,
    pub error_screenshot_prefix: String,
    pub report_prefix: String,
    /// Order hand-off file; relative paths resolve inside `exports/`
    pub orders_csv: PathBuf,
    /// Embed the screenshot into the report as a data URI
    pub inline_screenshot: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            screenshot_prefix: DEFAULT_SCREENSHOT_PREFIX.to_string(),
            error_screenshot_prefix: DEFAULT_ERROR_SCREENSHOT_PREFIX.to_string(),
            report_prefix: DEFAULT_REPORT_PREFIX.to_string(),
            orders_csv: PathBuf::from(DEFAULT_ORDERS_CSV),
            inline_screenshot: false,
        }
    }
}

/// Login for one application. The password never appears in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    fn require(&self, email: &'static str, password: &'static str) -> ConfigResult<&Self> {
        if self.email.is_empty() {
            return Err(ConfigError::Missing(email));
        }
        if self.password.is_empty() {
            return Err(ConfigError::Missing(password));
        }
        Ok(self)
    }

    fn masked(&self) -> Self {
        Self {
            email: self.email.clone(),
            password: mask(&self.password),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &mask(&self.password))
            .finish()
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        MASK.to_string()
    }
}

/// Storefront target and selectors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontSettings {
    pub base_url: String,
    pub credentials: Credentials,
    /// Fill the delivery address form when set
    pub delivery_address: Option<DeliveryAddress>,
    pub selectors: StorefrontSelectors,
}

impl StorefrontSettings {
    pub fn base_url(&self) -> ConfigResult<&str> {
        non_empty(&self.base_url, "storefront.base_url")
    }

    pub fn credentials(&self) -> ConfigResult<&Credentials> {
        self.credentials
            .require("storefront.credentials.email", "storefront.credentials.password")
    }
}

/// Values for the optional delivery address form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

impl DeliveryAddress {
    /// `(label, selectors, value)` per form field, in form order
    pub fn fields<'a>(&'a self, selectors: &'a AddressSelectors) -> [(&'static str, &'a SelectorGroup, &'a str); 7] {
        [
            ("First Name", &selectors.first_name, self.first_name.as_str()),
            ("Last Name", &selectors.last_name, self.last_name.as_str()),
            ("Email", &selectors.email, self.email.as_str()),
            ("Phone", &selectors.phone, self.phone.as_str()),
            ("Address", &selectors.address, self.address.as_str()),
            ("City", &selectors.city, self.city.as_str()),
            ("Postal Code", &selectors.postal_code, self.postal_code.as_str()),
        ]
    }
}

/// Payment form test data
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentSettings {
    /// Name or id of the hosted payment iframe
    pub frame: String,
    pub card_number: String,
    /// Expiry as typed into the form (`MM/YY`)
    pub expiry: String,
    pub cvv: String,
    pub holder_name: String,
    pub email: String,
    /// One-time password for the 3-D Secure challenge
    pub otp: String,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            frame: DEFAULT_PAYMENT_FRAME.to_string(),
            card_number: DEFAULT_TEST_CARD.to_string(),
            expiry: "12/28".to_string(),
            cvv: "100".to_string(),
            holder_name: "Test User".to_string(),
            email: "testuser@example.com".to_string(),
            otp: "123456".to_string(),
        }
    }
}

impl fmt::Debug for PaymentSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentSettings")
            .field("frame", &self.frame)
            .field("card_number", &mask(&self.card_number))
            .field("expiry", &self.expiry)
            .field("cvv", &mask(&self.cvv))
            .field("holder_name", &self.holder_name)
            .field("email", &self.email)
            .field("otp", &mask(&self.otp))
            .finish()
    }
}

/// Fulfillment back-office target and selectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FulfillmentSettings {
    pub url: String,
    pub credentials: Credentials,
    /// Tenant shown on the environment picker after login
    pub tenant: String,
    /// Package button label on the prepare-shipment dialog
    pub package: String,
    /// Parcel weight as typed
    pub weight: String,
    pub selectors: FulfillmentSelectors,
}

impl Default for FulfillmentSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            credentials: Credentials::default(),
            tenant: String::new(),
            package: "Medium Bag".to_string(),
            weight: "12".to_string(),
            selectors: FulfillmentSelectors::default(),
        }
    }
}

impl FulfillmentSettings {
    pub fn url(&self) -> ConfigResult<&str> {
        non_empty(&self.url, "fulfillment.url")
    }

    pub fn credentials(&self) -> ConfigResult<&Credentials> {
        self.credentials
            .require("fulfillment.credentials.email", "fulfillment.credentials.password")
    }

    /// Selector for the configured tenant entry
    pub fn tenant_selector(&self) -> ConfigResult<SelectorGroup> {
        let tenant = non_empty(&self.tenant, "fulfillment.tenant")?;
        Ok(SelectorGroup::new().xpath(format!("//span[normalize-space(text())={}]", xpath_literal(tenant))))
    }

    /// Selector for the configured package button
    pub fn package_selector(&self) -> SelectorGroup {
        SelectorGroup::new().xpath(format!(
            "//div/button[contains(normalize-space(text()),{})]",
            xpath_literal(self.package.trim())
        ))
    }
}

fn non_empty<'a>(value: &'a str, key: &'static str) -> ConfigResult<&'a str> {
    if value.trim().is_empty() {
        Err(ConfigError::Missing(key))
    } else {
        Ok(value)
    }
}

/// Quote a string as an XPath literal, using `concat()` when it holds both
/// quote kinds
pub fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{}'", s)
    } else if !s.contains('"') {
        format!("\"{}\"", s)
    } else {
        let parts: Vec<String> = s.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

impl ScenarioConfig {
    /// Load from a TOML file, or built-in defaults when no file is given
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&text)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Overlay secrets from `lookup` (normally the process environment)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let targets: [(&str, &mut String); 5] = [
            (ENV_STOREFRONT_EMAIL, &mut self.storefront.credentials.email),
            (ENV_STOREFRONT_PASSWORD, &mut self.storefront.credentials.password),
            (ENV_BACKOFFICE_EMAIL, &mut self.fulfillment.credentials.email),
            (ENV_BACKOFFICE_PASSWORD, &mut self.fulfillment.credentials.password),
            (ENV_CARD_NUMBER, &mut self.payment.card_number),
        ];
        for (key, target) in targets {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *target = value;
            }
        }
    }

    /// Overlay secrets from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    pub fn report_title(&self) -> &str {
        if self.report_title.is_empty() {
            DEFAULT_REPORT_TITLE
        } else {
            &self.report_title
        }
    }

    /// TOML rendering with passwords and card data masked
    pub fn to_masked_toml(&self) -> ConfigResult<String> {
        let mut masked = self.clone();
        masked.storefront.credentials = self.storefront.credentials.masked();
        masked.fulfillment.credentials = self.fulfillment.credentials.masked();
        masked.payment.card_number = mask(&self.payment.card_number);
        masked.payment.cvv = mask(&self.payment.cvv);
        masked.payment.otp = mask(&self.payment.otp);
        Ok(toml::to_string_pretty(&masked)?)
    }
}

// ============================================================================
// Default Selectors
// ============================================================================

fn xpath(expr: &str) -> SelectorGroup {
    SelectorGroup::from(SelectorCandidate::xpath(expr))
}

fn name(name: &str) -> SelectorGroup {
    SelectorGroup::from(SelectorCandidate::name(name))
}

fn css_list(selectors: &[&str]) -> SelectorGroup {
    selectors.iter().copied().map(SelectorCandidate::css).collect()
}

fn xpath_list(exprs: &[&str]) -> SelectorGroup {
    exprs.iter().copied().map(SelectorCandidate::xpath).collect()
}

/// Storefront selector groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontSelectors {
    pub sign_in: SelectorGroup,
    pub login_option: SelectorGroup,
    pub use_email: SelectorGroup,
    pub email: SelectorGroup,
    pub password: SelectorGroup,
    pub login_button: SelectorGroup,
    pub department: SelectorGroup,
    pub category: SelectorGroup,
    /// Product tiles by their listing class
    pub product_primary: SelectorGroup,
    /// Generic product markup tried when the listing class is absent
    pub product_fallback: SelectorGroup,
    /// Structural fallbacks tried after scrolling further
    pub product_xpath: SelectorGroup,
    pub size: SelectorGroup,
    pub add_to_cart: SelectorGroup,
    pub go_to_cart: SelectorGroup,
    pub checkout: SelectorGroup,
    pub home_delivery: SelectorGroup,
    pub continue_delivery: SelectorGroup,
    pub more_payment_options: SelectorGroup,
    pub continue_to_payment: SelectorGroup,
    pub card_number: SelectorGroup,
    pub card_expiry: SelectorGroup,
    pub card_cvv: SelectorGroup,
    pub card_holder: SelectorGroup,
    pub card_email: SelectorGroup,
    pub continue_payment: SelectorGroup,
    pub otp: SelectorGroup,
    pub submit_otp: SelectorGroup,
    pub view_order_details: SelectorGroup,
    pub order_id: SelectorGroup,
    pub address: AddressSelectors,
}

impl Default for StorefrontSelectors {
    fn default() -> Self {
        Self {
            sign_in: xpath("//div[contains(text(),'Log in | Sign up')]"),
            login_option: xpath("(//div[contains(text(),'Log in')])[2]"),
            use_email: xpath("//div[contains(text(),'Use email instead')]"),
            email: xpath("(//input[@type='email'])[1]"),
            password: xpath("(//input[@type='password'])[1]"),
            login_button: xpath("//button[contains(text(),'Log in')]"),
            department: xpath("(//span[contains(text(),'Women')])[1]"),
            category: xpath("(//span[contains(text(),'Footwear')])"),
            product_primary: SelectorGroup::new().class_name("plp-card"),
            product_fallback: css_list(&[
                ".product-item",
                ".product-card",
                ".product-tile",
                ".product",
                "[data-testid*='product']",
                "[data-testid*='item']",
                ".item",
                "article",
                "a[href*='/product']",
                "a[href*='/item']",
                ".grid-item",
                ".catalog-item",
                ".listing-item",
                ".product-listing",
                ".merchandise-item",
                ".shop-item",
                ".browse-item",
                ".product-thumbnail",
                ".product-image",
            ]),
            product_xpath: xpath_list(&[
                "//a[contains(@href, '/product')]",
                "//a[contains(@href, '/item')]",
                "//div[contains(@class, 'product')]",
                "//article",
                "//img[contains(translate(@alt,'ABCDEFGHIJKLMNOPQRSTUVWXYZ','abcdefghijklmnopqrstuvwxyz'),'product') or contains(translate(@alt,'ABCDEFGHIJKLMNOPQRSTUVWXYZ','abcdefghijklmnopqrstuvwxyz'),'item')]",
                "//div[contains(@class, 'item')]",
                "//a[contains(@class, 'product')]",
            ]),
            size: xpath("(//button[contains(@class,'SizeVariant_size')])[1]"),
            add_to_cart: xpath("//button[contains(text(),'Add to cart')]"),
            go_to_cart: xpath("//button[contains(text(),'Go to Cart')]"),
            checkout: xpath("//button[contains(text(),'Checkout')]"),
            home_delivery: xpath("//div[contains(text(),'Home delivery')]"),
            continue_delivery: xpath("//button[contains(text(),'Continue')]"),
            more_payment_options: name("more-payment-options"),
            continue_to_payment: xpath("//button[contains(text(),'Continue to payment')]"),
            card_number: name("cardNumber"),
            card_expiry: name("expyear"),
            card_cvv: name("cvv"),
            card_holder: name("name"),
            card_email: name("email"),
            continue_payment: xpath("//button[contains(text(),'Continue payment')]"),
            otp: name("challengeDataEntry"),
            submit_otp: xpath("//button[contains(text(),'Submit')]"),
            view_order_details: xpath("//button[contains(text(),'View order details')]"),
            order_id: xpath("(//span[contains(@class,'body-lg-bold')])[1]"),
            address: AddressSelectors::default(),
        }
    }
}

/// Delivery address form fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressSelectors {
    pub first_name: SelectorGroup,
    pub last_name: SelectorGroup,
    pub email: SelectorGroup,
    pub phone: SelectorGroup,
    pub address: SelectorGroup,
    pub city: SelectorGroup,
    pub postal_code: SelectorGroup,
}

fn field_by_hint(key: &str, placeholder: &str) -> SelectorGroup {
    SelectorGroup::new()
        .css(format!("input[name*='{}']", key))
        .css(format!("input[id*='{}']", key))
        .css(format!("input[placeholder*='{}']", placeholder))
        .css(format!("input[placeholder*='{}']", placeholder.to_lowercase()))
}

impl Default for AddressSelectors {
    fn default() -> Self {
        Self {
            first_name: field_by_hint("firstName", "First"),
            last_name: field_by_hint("lastName", "Last"),
            email: css_list(&["input[name*='email']", "input[id*='email']", "input[type='email']"]),
            phone: field_by_hint("phone", "Phone"),
            address: field_by_hint("address", "Address"),
            city: field_by_hint("city", "City"),
            postal_code: css_list(&[
                "input[name*='postal']",
                "input[id*='postal']",
                "input[name*='zip']",
                "input[id*='zip']",
                "input[placeholder*='Postal']",
                "input[placeholder*='postal']",
            ]),
        }
    }
}

/// Fulfillment back-office selector groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FulfillmentSelectors {
    pub email: SelectorGroup,
    pub next: SelectorGroup,
    pub password: SelectorGroup,
    pub login_button: SelectorGroup,
    pub menu: SelectorGroup,
    pub orders_menu: SelectorGroup,
    pub orders_link: SelectorGroup,
    pub search: SelectorGroup,
    pub order_row: SelectorGroup,
    pub shipments_tab: SelectorGroup,
    pub shipment_link: SelectorGroup,
    pub validate_stock: SelectorGroup,
    pub quantity: SelectorGroup,
    pub stock_input: SelectorGroup,
    pub packing_slip: SelectorGroup,
    pub prepare_shipment: SelectorGroup,
    pub weight: SelectorGroup,
    pub save: SelectorGroup,
    pub print_label: SelectorGroup,
    pub complete_shipment: SelectorGroup,
    pub close: SelectorGroup,
}

impl Default for FulfillmentSelectors {
    fn default() -> Self {
        Self {
            email: name("Email"),
            next: SelectorGroup::new().id("buttonSubmit"),
            password: name("Password"),
            login_button: xpath("//input[contains(@value,'Log in')]"),
            menu: xpath("//i[contains(@class,'hamburgerMenu')]"),
            orders_menu: xpath("//a[text()='Orders']"),
            orders_link: xpath("//a[text()=' Orders ']"),
            search: xpath("(//input[contains(@name,'inputEl')])[2]"),
            order_row: xpath("//tr[contains(@id,'gridview')]"),
            shipments_tab: xpath("//li[contains(text(),'Shipments')]"),
            shipment_link: xpath("//div[contains(@class,'labelvalue')]/a"),
            validate_stock: xpath("//button[text()=' Proceed To Validate Items In Stock ']"),
            quantity: xpath("//span[contains(text(),'Quantity')]/following-sibling::div[contains(@class,'inserted')]"),
            stock_input: xpath("//input[@placeholder='Current Stock Amount']"),
            packing_slip: xpath("//div/button[contains(text(),'Packing Slip')]"),
            prepare_shipment: xpath("//div/button[contains(text(),'Prepare for Shipment')]"),
            weight: xpath("//input[@placeholder='Weight']"),
            save: xpath("//span[contains(text(),'Save')]"),
            print_label: xpath("//span[contains(text(),' Print Shipping Label ')]"),
            complete_shipment: xpath("//button[contains(text(),' Yes, Complete Shipment ')]"),
            close: xpath("//button[contains(text(),' Close ')]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_config_defaults() {
        let config = Config::defaults();
        assert_eq!(config.webdriver_url, DEFAULT_WEBDRIVER_URL);
        assert_eq!(config.results_dir, PathBuf::from(DEFAULT_RESULTS_DIR));
        assert!(!config.headless);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert_eq!(config.scenario_file, None);
    }

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ENV_WEBDRIVER_URL, "http://grid:4444"),
            (ENV_HEADLESS, "yes"),
            (ENV_RESULTS_DIR, "/var/results"),
        ]
        .into_iter()
        .collect();
        let config = Config::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.webdriver_url, "http://grid:4444");
        assert!(config.headless);
        assert_eq!(config.results_dir, PathBuf::from("/var/results"));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ScenarioConfig::from_toml(
            r#"
            [storefront]
            base_url = "https://shop.example/en/fashion"

            [storefront.selectors]
            size = ["css:button.size", "//button[@data-size]"]

            [timeouts]
            element_wait_ms = 2000
            "#,
        )
        .unwrap();

        assert_eq!(config.storefront.base_url().unwrap(), "https://shop.example/en/fashion");
        assert_eq!(config.timeouts.element_wait_ms, 2000);
        assert_eq!(config.timeouts.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert_eq!(
            config.storefront.selectors.size,
            SelectorGroup::new().css("button.size").xpath("//button[@data-size]")
        );
        assert_eq!(config.storefront.selectors.checkout, StorefrontSelectors::default().checkout);
        assert_eq!(config.payment.frame, DEFAULT_PAYMENT_FRAME);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        assert!(matches!(
            ScenarioConfig::from_toml("[storefront\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_values_are_reported() {
        let config = ScenarioConfig::default();
        assert!(matches!(
            config.storefront.base_url(),
            Err(ConfigError::Missing("storefront.base_url"))
        ));
        assert!(matches!(
            config.storefront.credentials(),
            Err(ConfigError::Missing("storefront.credentials.email"))
        ));
        assert!(matches!(
            config.fulfillment.tenant_selector(),
            Err(ConfigError::Missing("fulfillment.tenant"))
        ));
    }

    #[test]
    fn test_overrides_replace_secrets_only_when_set() {
        let mut config = ScenarioConfig::default();
        config.storefront.credentials = Credentials::new("file@example.com", "from-file");

        let vars: HashMap<&str, &str> = [
            (ENV_STOREFRONT_PASSWORD, "from-env"),
            (ENV_BACKOFFICE_EMAIL, "ops@example.com"),
            (ENV_CARD_NUMBER, ""),
        ]
        .into_iter()
        .collect();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.storefront.credentials.email, "file@example.com");
        assert_eq!(config.storefront.credentials.password, "from-env");
        assert_eq!(config.fulfillment.credentials.email, "ops@example.com");
        assert_eq!(config.payment.card_number, DEFAULT_TEST_CARD);
    }

    #[test]
    fn test_masked_toml_hides_secrets() {
        let mut config = ScenarioConfig::default();
        config.storefront.credentials = Credentials::new("qa@example.com", "hunter2");
        let text = config.to_masked_toml().unwrap();

        assert!(text.contains("qa@example.com"));
        assert!(!text.contains("hunter2"));
        assert!(!text.contains(DEFAULT_TEST_CARD));
        assert!(text.contains(MASK));

        // masked output still parses
        let back = ScenarioConfig::from_toml(&text).unwrap();
        assert_eq!(back.storefront.selectors, config.storefront.selectors);
    }

    #[test]
    fn test_debug_never_prints_password() {
        let creds = Credentials::new("qa@example.com", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("qa@example.com"));
    }

    #[test]
    fn test_xpath_literal() {
        assert_eq!(xpath_literal("Marks UAT"), "'Marks UAT'");
        assert_eq!(xpath_literal("Kid's"), "\"Kid's\"");
        assert_eq!(xpath_literal(r#"a'b"c"#), r#"concat('a', "'", 'b"c')"#);
    }

    #[test]
    fn test_tenant_and_package_selectors() {
        let mut settings = FulfillmentSettings::default();
        settings.tenant = "Retail UAT".to_string();
        assert_eq!(
            settings.tenant_selector().unwrap(),
            SelectorGroup::new().xpath("//span[normalize-space(text())='Retail UAT']")
        );
        assert_eq!(
            settings.package_selector(),
            SelectorGroup::new().xpath("//div/button[contains(normalize-space(text()),'Medium Bag')]")
        );
    }

    #[test]
    fn test_address_fields_follow_form_order() {
        let address = DeliveryAddress {
            first_name: "Jo".to_string(),
            city: "Dubai".to_string(),
            ..Default::default()
        };
        let selectors = AddressSelectors::default();
        let labels: Vec<&str> = address.fields(&selectors).iter().map(|f| f.0).collect();
        assert_eq!(
            labels,
            vec!["First Name", "Last Name", "Email", "Phone", "Address", "City", "Postal Code"]
        );
        assert_eq!(address.fields(&selectors)[5].2, "Dubai");
        assert_eq!(selectors.first_name.len(), 4);
    }
}
