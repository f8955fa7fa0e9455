//! Back-office fulfillment: find each order and ship it.

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::browser::BrowserSession;

use super::flow::Flow;

/// Sign in to the back office and complete the shipment of every order.
///
/// Orders are processed in the given order; the first failure stops the run.
pub fn run<S>(flow: &mut Flow<'_, S>, orders: &[String]) -> Result<()>
where
    S: BrowserSession + ?Sized,
{
    if orders.is_empty() {
        bail!("No orders to fulfil");
    }
    let settings = &flow.config().fulfillment;
    let url = settings.url()?;
    let credentials = settings.credentials()?;
    let tenant = settings.tenant_selector()?;
    let selectors = &settings.selectors;

    flow.step("🏬", "Fulfillment", &format!("Opening back office for {} order(s)", orders.len()));
    flow.open(url)?;

    flow.type_into_clickable(&selectors.email, &credentials.email, "back office email")?;
    flow.click(&selectors.next, "Email Submitted")?;
    flow.type_into_clickable(&selectors.password, &credentials.password, "back office password")?;
    flow.click(&selectors.login_button, "Back Office Login")?;
    flow.settle();
    flow.click(&tenant, "Tenant Selected")?;
    flow.settle();
    flow.page_step("✅", "Back Office Ready", "Signed in to the back office");

    for order in orders {
        ship(flow, order).with_context(|| format!("Fulfillment of order {} failed", order))?;
    }
    Ok(())
}

fn ship<S>(flow: &mut Flow<'_, S>, order: &str) -> Result<()>
where
    S: BrowserSession + ?Sized,
{
    let settings = &flow.config().fulfillment;
    let selectors = &settings.selectors;
    let session = flow.session();

    flow.step("🔎", "Order Search", &format!("Searching for order {}", order));
    flow.click(&selectors.menu, "Menu Opened")?;
    flow.click(&selectors.orders_menu, "Orders Menu")?;
    flow.click(&selectors.orders_link, "Orders List")?;
    flow.settle();

    let search = flow.type_into_clickable(&selectors.search, order, "order search")?;
    session
        .press_enter(&search)
        .context("Failed to submit order search")?;
    flow.settle();

    flow.click(&selectors.order_row, "Order Opened")?;
    flow.click(&selectors.shipments_tab, "Shipments Tab")?;
    flow.click(&selectors.shipment_link, "Shipment Opened")?;
    flow.settle();
    flow.scroll_to(350)?;

    flow.click(&selectors.validate_stock, "Stock Validation")?;
    let quantity = flow.text_of(&selectors.quantity, "ordered quantity")?;
    if quantity.is_empty() {
        bail!("Shipment shows no quantity for order {}", order);
    }
    flow.type_into(&selectors.stock_input, &quantity, "current stock amount")?;
    flow.step("📦", "Stock Validated", &format!("Confirmed {} item(s) in stock", quantity));

    flow.click(&selectors.packing_slip, "Packing Slip")?;
    flow.click(&selectors.prepare_shipment, "Prepare Shipment")?;
    flow.click(&settings.package_selector(), "Package Selected")?;
    flow.type_into(&selectors.weight, &settings.weight, "parcel weight")?;
    flow.click(&selectors.save, "Shipment Saved")?;

    flow.click(&selectors.print_label, "Shipping Label")?;
    // The label opens the print dialog as an alert on some tenants
    if let Err(err) = session.dismiss_alert() {
        debug!(error = %err, "no print dialog to dismiss");
    }

    flow.click(&selectors.complete_shipment, "Shipment Completed")?;
    flow.click(&selectors.close, "Dialog Closed")?;
    flow.page_step("✅", "Fulfillment Complete", &format!("Order {} shipped", order));
    Ok(())
}
