//! Storefront checkout: sign in, pick a product, buy it, capture the order.

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use crate::artifacts::ArtifactDirs;
use crate::browser::BrowserSession;
use crate::config::{Credentials, DeliveryAddress};
use crate::export::{OrderRecord, append_order};
use crate::locate::Located;
use crate::steps::StepKind;

use super::flow::Flow;

/// Run the storefront stages.
///
/// Returns the captured order number, or `None` when the run stopped at a
/// recorded, non-exceptional failure (no product, product not clickable,
/// checkout error). Unexpected faults propagate to the caller.
pub fn run<S>(flow: &mut Flow<'_, S>, dirs: &ArtifactDirs) -> Result<Option<String>>
where
    S: BrowserSession + ?Sized,
{
    let store = &flow.config().storefront;
    let base_url = store.base_url()?;
    let credentials = store.credentials()?;

    flow.step("🌐", "Navigation", "Navigating to the storefront home page");
    flow.open(base_url)?;

    sign_in(flow, credentials)?;
    browse(flow)?;

    let Some(product) = find_product(flow) else {
        flow.fail("❌", "No Products Found", "No products found on the current page", "");
        return Ok(None);
    };
    flow.step("✅", "Product Located", "Successfully found a product on the page");
    flow.reveal(&product.element);
    if !flow.click_element(&product.element, "Product Selected") {
        flow.fail(
            "❌",
            "Product Selection Failed",
            "Could not select product after multiple attempts",
            "",
        );
        return Ok(None);
    }
    record_product(flow);

    add_to_bag(flow)?;

    if let Err(err) = checkout(flow) {
        flow.fail(
            "❌",
            "Checkout Flow Error",
            &format!("Checkout flow failed: {}", err),
            &format!("{:?}", err),
        );
        return Ok(None);
    }

    let order_id = pay(flow)?;
    export_order(flow, dirs, &order_id);
    Ok(Some(order_id))
}

fn sign_in<S>(flow: &mut Flow<'_, S>, credentials: &Credentials) -> Result<()>
where
    S: BrowserSession + ?Sized,
{
    let selectors = &flow.config().storefront.selectors;

    flow.step("🔐", "Login", "Opening the sign in dialog");
    flow.click(&selectors.sign_in, "Sign In Opened")?;
    flow.click(&selectors.login_option, "Login Option Selected")?;
    flow.click(&selectors.use_email, "Email Login Selected")?;

    flow.type_into_clickable(&selectors.email, &credentials.email, "email field")?;
    flow.type_into_clickable(&selectors.password, &credentials.password, "password field")?;
    flow.click(&selectors.login_button, "Login Submitted")?;
    flow.settle();

    flow.step("✅", "Login", "Successfully logged in to the application");
    Ok(())
}

fn browse<S>(flow: &mut Flow<'_, S>) -> Result<()>
where
    S: BrowserSession + ?Sized,
{
    let selectors = &flow.config().storefront.selectors;

    flow.step("🧭", "Navigation", "Looking for the department menu");
    flow.hover(&selectors.department, "department menu")?;
    flow.step("✅", "Department Found", "Located the department in the navigation");

    flow.click(&selectors.category, "Category Opened")?;
    flow.settle();

    flow.step("📜", "Page Scroll", "Scrolling down to find products on the page");
    flow.scroll_to(800)?;
    Ok(())
}

/// Listing class first, then generic product markup, then structural
/// fallbacks after scrolling further down.
fn find_product<S>(flow: &mut Flow<'_, S>) -> Option<Located<S::Element>>
where
    S: BrowserSession + ?Sized,
{
    let selectors = &flow.config().storefront.selectors;

    flow.step("🛍️", "Product Search", "Looking for products after scrolling");
    if let Some(found) = flow.find_waiting(&selectors.product_primary) {
        product_found(flow, &found);
        return Some(found);
    }
    flow.warn(
        "⚠️",
        "Specific Class Search",
        &format!("Could not find products with {}", selectors.product_primary),
    );

    flow.step("🔍", "Fallback Search", "Trying fallback product selectors");
    if let Some(found) = flow.find(&selectors.product_fallback) {
        product_found(flow, &found);
        return Some(found);
    }

    flow.step("📜", "Further Scroll", "No products found, scrolling down further");
    if let Err(err) = flow.scroll_to(1500) {
        warn!(error = %err, "further scroll failed");
    }
    flow.settle();
    let found = flow.find(&selectors.product_xpath)?;
    product_found(flow, &found);
    Some(found)
}

fn product_found<S, E>(flow: &mut Flow<'_, S>, found: &Located<E>)
where
    S: BrowserSession + ?Sized,
{
    flow.step(
        "✅",
        "Product Found",
        &format!(
            "Found {} products using selector: {}",
            found.match_count, found.candidate
        ),
    );
}

fn record_product<S>(flow: &mut Flow<'_, S>)
where
    S: BrowserSession + ?Sized,
{
    flow.settle();
    let session = flow.session();
    let title = session.title().unwrap_or_default();
    let url = session.current_url().unwrap_or_default();
    flow.run().set_product(title.as_str(), url.as_str());
    flow.page_step("📦", "Product Page", "Navigated to product page");
}

fn add_to_bag<S>(flow: &mut Flow<'_, S>) -> Result<()>
where
    S: BrowserSession + ?Sized,
{
    let selectors = &flow.config().storefront.selectors;

    flow.click(&selectors.size, "Size Selected")?;

    flow.step("🛒", "Add to Bag Search", "Looking for Add to bag button");
    flow.scroll_to(250)?;
    flow.click(&selectors.add_to_cart, "Add to Bag")?;
    flow.settle();

    let url = flow.session().current_url().unwrap_or_default();
    flow.run().record(
        "🎉",
        "Add to Bag Success",
        "Product added to bag successfully!",
        StepKind::Info,
        &format!("Final URL: {}", url),
    );
    Ok(())
}

fn checkout<S>(flow: &mut Flow<'_, S>) -> Result<()>
where
    S: BrowserSession + ?Sized,
{
    let store = &flow.config().storefront;
    let selectors = &store.selectors;

    flow.step("🛒", "Checkout Flow", "Starting checkout process");
    flow.click(&selectors.go_to_cart, "Go to Cart")?;
    flow.settle();
    flow.page_step("📄", "Checkout Page", "Navigated to checkout page");

    flow.click(&selectors.checkout, "Checkout")?;
    flow.settle();
    flow.page_step("📄", "Delivery Page", "Navigated to delivery page");

    if let Some(address) = &store.delivery_address {
        fill_address(flow, address);
    }

    flow.click(&selectors.home_delivery, "Delivery Option Selected")?;
    flow.click(&selectors.continue_delivery, "Delivery Confirmed")?;
    Ok(())
}

/// Fill whatever address fields exist. Missing, hidden or failing fields are
/// warnings; the form is never fatal.
fn fill_address<S>(flow: &mut Flow<'_, S>, address: &DeliveryAddress)
where
    S: BrowserSession + ?Sized,
{
    let selectors = &flow.config().storefront.selectors.address;
    let session = flow.session();

    flow.step("📝", "Delivery Address Form", "Starting to fill delivery address form");
    for (label, group, value) in address.fields(selectors) {
        if value.is_empty() {
            continue;
        }
        let Some(found) = flow.find(group) else {
            flow.warn("⚠️", &format!("Field Not Found: {}", label), &format!("Could not find {} field", label));
            continue;
        };
        let element = found.element;

        let usable = session.is_displayed(&element).unwrap_or(false) && session.is_enabled(&element).unwrap_or(false);
        if !usable {
            flow.warn(
                "⚠️",
                &format!("Field Skipped: {}", label),
                &format!("Field {} is not visible or enabled", label),
            );
            continue;
        }

        flow.reveal(&element);
        if let Err(err) = session.clear(&element) {
            debug!(field = label, error = %err, "could not clear field before typing");
        }
        match session.send_keys(&element, value) {
            Ok(()) => flow.step(
                "✅",
                &format!("Field Filled: {}", label),
                &format!("Successfully filled {}", label),
            ),
            Err(err) => flow.warn(
                "⚠️",
                &format!("Field Error: {}", label),
                &format!("Error filling {}: {}", label, err),
            ),
        }
    }
    flow.step("✅", "Address Form Complete", "Finished filling delivery address form");
}

fn pay<S>(flow: &mut Flow<'_, S>) -> Result<String>
where
    S: BrowserSession + ?Sized,
{
    let selectors = &flow.config().storefront.selectors;
    let payment = &flow.config().payment;
    let session = flow.session();

    flow.step("💳", "Payment Flow", "Starting payment process");
    flow.scroll_to(350)?;
    flow.click(&selectors.more_payment_options, "More Payment Options")?;
    flow.click(&selectors.continue_to_payment, "Continue to Payment")?;
    flow.settle();

    session
        .switch_to_frame(&payment.frame)
        .with_context(|| format!("Payment frame '{}' not available", payment.frame))?;
    flow.step("🔐", "Payment Form", "Entered the payment form");

    flow.type_into(&selectors.card_number, &payment.card_number, "card number")?;
    flow.type_into(&selectors.card_expiry, &payment.expiry, "card expiry")?;
    flow.type_into(&selectors.card_cvv, &payment.cvv, "card security code")?;
    flow.type_into(&selectors.card_holder, &payment.holder_name, "card holder name")?;
    flow.type_into(&selectors.card_email, &payment.email, "payment email")?;
    flow.click(&selectors.continue_payment, "Card Details Submitted")?;

    session
        .switch_to_default_content()
        .context("Failed to leave the payment frame")?;
    flow.settle();

    flow.type_into_clickable(&selectors.otp, &payment.otp, "one-time password")?;
    flow.click(&selectors.submit_otp, "OTP Submitted")?;
    flow.settle();

    flow.click(&selectors.view_order_details, "Order Details Opened")?;
    flow.settle();

    let order_id = flow.text_of(&selectors.order_id, "order number")?;
    if order_id.is_empty() {
        bail!("Order confirmation page did not show an order number");
    }
    flow.run().set_order_id(order_id.as_str());
    flow.page_step("🧾", "Order Placed", &format!("Order {} confirmed", order_id));
    Ok(order_id)
}

/// Append the order to the hand-off file. Export failures are recorded as a
/// warning and never fail the run.
fn export_order<S>(flow: &mut Flow<'_, S>, dirs: &ArtifactDirs, order_id: &str)
where
    S: BrowserSession + ?Sized,
{
    let path = dirs.export_path(&flow.config().output.orders_csv);
    let record = {
        let run = flow.run();
        OrderRecord::new(order_id, run.product_title(), run.product_url())
    };

    match append_order(&path, &record) {
        Ok(()) => {
            let shown = path.display().to_string();
            flow.run().set_export_path(shown.as_str());
            flow.step("🧾", "CSV Export", &format!("Wrote order hand-off to {}", shown));
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "order export failed");
            flow.warn("⚠️", "CSV Export Failed", &format!("Could not write {}: {}", path.display(), err));
        }
    }
}
