//! Money calculation utilities using rust_decimal for precision
//!
//! Line and order totals are always recomputed from the snapshotted unit
//! prices, never accumulated incrementally.

use rust_decimal::prelude::*;
use shared::order::{AddonLine, ItemChange, OrderItemInput, OrderItemSnapshot, OrderSnapshot};

use super::error::{OrderError, OrderResult};
use crate::core::RestaurantScope;
use crate::services::CatalogLookup;

/// Rounding: 2 decimal places, midpoint away from zero
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed quantity per line (and per addon)
pub const MAX_QUANTITY: u32 = 999;
/// Maximum length of a line note, in characters
pub const MAX_NOTES_LEN: usize = 200;

/// Round a monetary value to cents
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

fn validate_quantity(quantity: u32, field: &str) -> OrderResult<()> {
    if quantity == 0 || quantity > MAX_QUANTITY {
        return Err(OrderError::Validation(format!(
            "{} must be between 1 and {}, got {}",
            field, MAX_QUANTITY, quantity
        )));
    }
    Ok(())
}

fn validate_notes(notes: Option<&str>) -> OrderResult<()> {
    if let Some(n) = notes
        && n.chars().count() > MAX_NOTES_LEN
    {
        return Err(OrderError::Validation(format!(
            "notes are too long ({} chars, max {})",
            n.chars().count(),
            MAX_NOTES_LEN
        )));
    }
    Ok(())
}

/// Validate an item input before it is resolved against the catalog
pub fn validate_item_input(item: &OrderItemInput) -> OrderResult<()> {
    if item.product_id.trim().is_empty() {
        return Err(OrderError::Validation("product_id must not be empty".into()));
    }
    validate_quantity(item.quantity, "quantity")?;
    for addon in &item.addons {
        validate_quantity(addon.quantity, "addon quantity")?;
    }
    validate_notes(item.notes.as_deref())
}

/// Validate an item change before it is applied
pub fn validate_item_change(change: &ItemChange) -> OrderResult<()> {
    match change {
        ItemChange::SetQuantity { quantity, .. } => validate_quantity(*quantity, "quantity"),
        ItemChange::SetNotes { notes, .. } => validate_notes(notes.as_deref()),
        ItemChange::Remove { .. } => Ok(()),
    }
}

/// Resolve an item input into a priced line snapshot
///
/// The product must be active and belong to the scope; size and addons must
/// belong to the product. Names, prices and tax rate are copied at this point.
pub fn resolve_item(
    scope: &RestaurantScope,
    input: &OrderItemInput,
    catalog: &dyn CatalogLookup,
) -> OrderResult<OrderItemSnapshot> {
    validate_item_input(input)?;

    let product = catalog
        .product(scope, &input.product_id)
        .filter(|p| p.is_active)
        .ok_or_else(|| {
            OrderError::Validation(format!("product {} is not available", input.product_id))
        })?;

    let (size_id, size_name, unit_price) = match input.size_id.as_deref() {
        Some(size_id) => {
            let size = product.find_size(size_id).ok_or_else(|| {
                OrderError::Validation(format!(
                    "size {} does not belong to product {}",
                    size_id, product.id
                ))
            })?;
            (Some(size.id.clone()), Some(size.name.clone()), size.price)
        }
        None => (None, None, product.price),
    };

    let mut addons = Vec::with_capacity(input.addons.len());
    for selection in &input.addons {
        let addon = product.find_addon(&selection.addon_id).ok_or_else(|| {
            OrderError::Validation(format!(
                "addon {} does not belong to product {}",
                selection.addon_id, product.id
            ))
        })?;
        addons.push(AddonLine {
            addon_id: addon.id.clone(),
            name: addon.name.clone(),
            unit_price: addon.price,
            quantity: selection.quantity,
        });
    }

    let mut line = OrderItemSnapshot {
        item_id: uuid::Uuid::new_v4().to_string(),
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        size_id,
        size_name,
        quantity: input.quantity,
        unit_price,
        addons,
        tax_rate: product.tax_rate,
        line_total: Decimal::ZERO,
        tax: Decimal::ZERO,
        notes: input.notes.clone(),
    };
    price_line(&mut line);
    Ok(line)
}

/// Recompute `line_total` and `tax` of one line
///
/// `line_total = (unit_price + Σ addon.unit_price × addon.quantity) × quantity`
pub fn price_line(item: &mut OrderItemSnapshot) {
    let addons: Decimal = item
        .addons
        .iter()
        .map(|a| a.unit_price * Decimal::from(a.quantity))
        .sum();
    let line_total = round_money((item.unit_price + addons) * Decimal::from(item.quantity));
    item.line_total = line_total;
    item.tax = round_money(line_total * item.tax_rate / Decimal::ONE_HUNDRED);
}

/// Recompute order totals from its lines
pub fn recalculate_totals(order: &mut OrderSnapshot) {
    let subtotal: Decimal = order.items.iter().map(|i| i.line_total).sum();
    let tax: Decimal = order.items.iter().map(|i| i.tax).sum();
    order.subtotal = round_money(subtotal);
    order.tax = round_money(tax);
    order.total = order.subtotal + order.tax;
}
