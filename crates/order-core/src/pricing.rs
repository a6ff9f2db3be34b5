//! # Cart Pricer
//!
//! Resolves cart line items against a restaurant's current menu and
//! computes the order total in integer minor currency units.

use crate::error::{OrderError, OrderResult};
use crate::order::CartLine;
use crate::restaurant::MenuItem;
use serde::Deserialize;

/// A cart item as it arrives on the wire.
///
/// Quantity is a string on the wire (legacy client shape) and is parsed
/// here; a non-numeric quantity fails the whole pricing call since it
/// signals a malformed or tampered request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub menu_item_id: String,
    pub name: String,
    pub quantity: String,
}

/// A priced cart: resolved lines plus the computed total
#[derive(Debug, Clone)]
pub struct PricedCart {
    pub lines: Vec<CartLine>,
    /// `sum(matched price * quantity) + delivery_price`, minor units
    pub total: i64,
}

/// Price a cart against the restaurant's current menu.
///
/// A cart item referencing a menu item that no longer exists contributes
/// zero to the total rather than aborting the checkout. Menus are edited
/// concurrently by restaurant owners; failing the whole order over a
/// just-deleted item would be worse than under-charging one line.
pub fn price_cart(
    items: &[CartItemRequest],
    menu: &[MenuItem],
    delivery_price: i64,
) -> OrderResult<PricedCart> {
    let mut lines = Vec::with_capacity(items.len());
    let mut total: i64 = 0;

    for item in items {
        let quantity: u32 = item.quantity.trim().parse().map_err(|_| {
            OrderError::Validation(format!(
                "non-numeric quantity {:?} for menu item {}",
                item.quantity, item.menu_item_id
            ))
        })?;

        if let Some(menu_item) = menu.iter().find(|m| m.id == item.menu_item_id) {
            total += menu_item.price * quantity as i64;
        }

        lines.push(CartLine {
            menu_item_id: item.menu_item_id.clone(),
            name: item.name.clone(),
            quantity,
        });
    }

    Ok(PricedCart {
        lines,
        total: total + delivery_price,
    })
}

/// Render a minor-unit amount as a major-unit decimal string.
///
/// Pure integer math; display-side rounding never feeds back into pricing.
pub fn format_minor_units(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}
