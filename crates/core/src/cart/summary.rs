//! Badge summary derivation.

use rust_decimal::Decimal;
use serde::Serialize;

use super::snapshot::{CartSnapshot, LineItem};
use crate::types::format_fixed2;

/// Quantities above this render as `"9+"`.
pub const MAX_DISPLAY_QUANTITY: u64 = 9;

const EMPTY_PILL_TEXT: &str = "0";
const EMPTY_PRICE_TEXT: &str = "0.00";
const TOTAL_CODE: &str = "total";

/// Render-ready values for the cart badges.
///
/// Recomputed from scratch on every refresh and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub total_quantity: u64,
    /// `"9+"` above [`MAX_DISPLAY_QUANTITY`], otherwise the plain count.
    pub quantity_display: String,
    /// Currency string from the API, or empty when none was found.
    pub formatted_price: String,
    /// Numeric amount backing `formatted_price`.
    pub raw_price: Decimal,
    /// Desktop pill: `"<price> (<count>)"`, `"<count>"`, or `"0"`.
    pub pill_text: String,
    /// Mobile price label under the cart icon.
    pub mobile_price_text: String,
}

impl Default for CartSummary {
    fn default() -> Self {
        Self::derive(None)
    }
}

impl CartSummary {
    /// Derive the badge summary from a snapshot.
    ///
    /// `None` yields the empty summary (`pill_text == "0"`,
    /// `mobile_price_text == "0.00"`).
    #[must_use]
    pub fn derive(snapshot: Option<&CartSnapshot>) -> Self {
        let (total_quantity, (formatted_price, raw_price)) = snapshot.map_or_else(
            || (0, (String::new(), Decimal::ZERO)),
            |s| (resolve_quantity(s), resolve_price(s)),
        );

        let quantity_display = quantity_display(total_quantity);

        let pill_text = if total_quantity == 0 {
            EMPTY_PILL_TEXT.to_string()
        } else if formatted_price.is_empty() {
            quantity_display.clone()
        } else {
            format!("{formatted_price} ({quantity_display})")
        };

        let mobile_price_text = if total_quantity == 0 {
            EMPTY_PRICE_TEXT.to_string()
        } else if !formatted_price.is_empty() {
            formatted_price.clone()
        } else if raw_price > Decimal::ZERO {
            format_fixed2(raw_price)
        } else {
            EMPTY_PRICE_TEXT.to_string()
        };

        Self {
            total_quantity,
            quantity_display,
            formatted_price,
            raw_price,
            pill_text,
            mobile_price_text,
        }
    }

    /// True when the cart holds nothing; the count badge is hidden.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_quantity == 0
    }
}

/// Capped quantity string shown on the count badge.
#[must_use]
pub fn quantity_display(quantity: u64) -> String {
    if quantity > MAX_DISPLAY_QUANTITY {
        format!("{MAX_DISPLAY_QUANTITY}+")
    } else {
        quantity.to_string()
    }
}

/// First non-zero of: `products` sum, `cart_items` sum, scalar count fields.
fn resolve_quantity(snapshot: &CartSnapshot) -> u64 {
    [&snapshot.products, &snapshot.cart_items]
        .into_iter()
        .map(|lines| sum_lines(lines))
        .find(|&sum| sum > 0)
        .or_else(|| {
            [
                snapshot.cart_items_quantity,
                snapshot.products_count,
                snapshot.items_count,
            ]
            .into_iter()
            .flatten()
            .find(|&count| count > 0)
        })
        .unwrap_or(0)
}

/// A line without a usable quantity (or with zero) counts once.
fn sum_lines(lines: &[LineItem]) -> u64 {
    lines
        .iter()
        .map(|line| line.quantity.filter(|&q| q > 0).unwrap_or(1))
        .fold(0, u64::saturating_add)
}

/// Returns `(formatted_price, raw_price)`.
fn resolve_price(snapshot: &CartSnapshot) -> (String, Decimal) {
    let mut formatted = String::new();
    let mut raw = Decimal::ZERO;

    if let Some(total) = snapshot.totals.iter().find(|t| t.code == TOTAL_CODE) {
        formatted = total.value_string.clone().unwrap_or_default();
        raw = total.value.unwrap_or(Decimal::ZERO);
    }

    if formatted.is_empty()
        && let Some(sub_total) = &snapshot.sub_total
    {
        formatted = [&sub_total.formatted, &sub_total.value_string]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .cloned()
            .unwrap_or_default();
        raw = sub_total.amount.or(sub_total.value).unwrap_or(Decimal::ZERO);
    }

    if formatted.is_empty()
        && let Some(total_price) = snapshot.total_price.as_ref().filter(|p| p.is_set())
    {
        formatted = total_price.display();
        raw = total_price.amount();
    }

    (formatted, raw)
}
