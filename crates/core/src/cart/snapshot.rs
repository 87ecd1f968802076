//! Lenient representation of a cart as returned by the storefront API.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Number, Value};

use crate::gift::GiftCard;
use crate::types::{CartId, LineItemId, js_number_string, lenient_decimal};

/// Point-in-time read of the visitor's cart.
///
/// Every field is optional. Parsing never fails: a field with an unexpected
/// JSON type is treated as absent, numbers are accepted as JSON numbers or
/// numeric strings, and a body wrapped as `{"cart": {...}}` is unwrapped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct CartSnapshot {
    /// Cart identifier, when the API includes it.
    pub id: Option<CartId>,
    /// Per-product line items.
    pub products: Vec<LineItem>,
    /// Alternate line item representation used by some API versions.
    pub cart_items: Vec<LineItem>,
    pub cart_items_quantity: Option<u64>,
    pub products_count: Option<u64>,
    pub items_count: Option<u64>,
    /// Computed totals (`sub_total`, `discount`, `total`, ...).
    pub totals: Vec<TotalLine>,
    pub sub_total: Option<SubTotal>,
    pub total_price: Option<PriceScalar>,
    /// Gift card details, when the shopper marked the order as a gift.
    pub gift_card: Option<GiftCard>,
}

/// A single cart line; only the quantity matters for the badge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineItem {
    pub id: Option<LineItemId>,
    /// `None` when missing, negative, or not numeric.
    pub quantity: Option<u64>,
}

/// One entry of the `totals` array.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TotalLine {
    pub code: String,
    pub value: Option<Decimal>,
    pub value_string: Option<String>,
}

/// The `sub_total` object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubTotal {
    pub formatted: Option<String>,
    pub value_string: Option<String>,
    pub amount: Option<Decimal>,
    pub value: Option<Decimal>,
}

/// The bare `total_price` field, which arrives as a number or a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceScalar {
    Number(Number),
    Text(String),
}

impl PriceScalar {
    /// Zero and the empty string count as "not set".
    #[must_use]
    pub fn is_set(&self) -> bool {
        match self {
            Self::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Self::Text(s) => !s.is_empty(),
        }
    }

    /// The value as it should appear on the page, unformatted.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Number(n) => js_number_string(n),
            Self::Text(s) => s.clone(),
        }
    }

    /// Numeric value, or zero when the text is not a number.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        match self {
            Self::Number(n) => lenient_decimal(&Value::Number(n.clone())),
            Self::Text(s) => lenient_decimal(&Value::String(s.clone())),
        }
        .unwrap_or(Decimal::ZERO)
    }
}

impl CartSnapshot {
    /// Build a snapshot from an arbitrary JSON value.
    ///
    /// Anything that is not an object yields the empty snapshot.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::from_map(unwrap_cart(map)),
            _ => Self::default(),
        }
    }

    fn from_map(map: Map<String, Value>) -> Self {
        Self {
            id: map.get("id").and_then(lenient_id),
            products: line_items(map.get("products")),
            cart_items: line_items(map.get("cart_items")),
            cart_items_quantity: map.get("cart_items_quantity").and_then(lenient_count),
            products_count: map.get("products_count").and_then(lenient_count),
            items_count: map.get("items_count").and_then(lenient_count),
            totals: totals(map.get("totals")),
            sub_total: map.get("sub_total").and_then(sub_total),
            total_price: map.get("total_price").and_then(price_scalar),
            gift_card: map.get("gift_card_details").and_then(GiftCard::from_value),
        }
    }
}

impl From<Value> for CartSnapshot {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

// =============================================================================
// Field Parsers
// =============================================================================

/// Some endpoints wrap the cart as `{"cart": {...}}`.
fn unwrap_cart(mut map: Map<String, Value>) -> Map<String, Value> {
    match map.remove("cart") {
        Some(Value::Object(inner)) => inner,
        Some(other) => {
            map.insert("cart".to_string(), other);
            map
        }
        None => map,
    }
}

fn lenient_id<T: From<String>>(value: &Value) -> Option<T> {
    match value {
        Value::String(s) if !s.is_empty() => Some(T::from(s.clone())),
        Value::Number(n) => Some(T::from(n.to_string())),
        _ => None,
    }
}

/// Non-negative whole count from a number or numeric string.
fn lenient_count(value: &Value) -> Option<u64> {
    let f = match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return Some(u);
            }
            n.as_f64()?
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(u) = s.parse::<u64>() {
                return Some(u);
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };

    if f.is_finite() && f >= 0.0 && f < 1.8e19 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range checked above
        Some(f.trunc() as u64)
    } else {
        None
    }
}

/// Text from a string, or a number rendered as the browser would.
fn lenient_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(js_number_string(n)),
        _ => None,
    }
}

fn line_items(value: Option<&Value>) -> Vec<LineItem> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .map(|item| match item {
            Value::Object(fields) => LineItem {
                id: fields.get("id").and_then(lenient_id),
                quantity: fields.get("quantity").and_then(lenient_count),
            },
            _ => LineItem::default(),
        })
        .collect()
}

fn totals(value: Option<&Value>) -> Vec<TotalLine> {
    let Some(Value::Array(entries)) = value else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(Value::as_object)
        .map(|fields| TotalLine {
            code: fields
                .get("code")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            value: fields.get("value").and_then(lenient_decimal),
            value_string: fields.get("value_string").and_then(lenient_text),
        })
        .collect()
}

fn sub_total(value: &Value) -> Option<SubTotal> {
    let fields = value.as_object()?;
    Some(SubTotal {
        formatted: fields.get("formatted").and_then(lenient_text),
        value_string: fields.get("value_string").and_then(lenient_text),
        amount: fields.get("amount").and_then(lenient_decimal),
        value: fields.get("value").and_then(lenient_decimal),
    })
}

fn price_scalar(value: &Value) -> Option<PriceScalar> {
    match value {
        Value::Number(n) => Some(PriceScalar::Number(n.clone())),
        Value::String(s) => Some(PriceScalar::Text(s.clone())),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_object_is_empty_snapshot() {
        assert_eq!(CartSnapshot::from_value(json!(null)), CartSnapshot::default());
        assert_eq!(CartSnapshot::from_value(json!([1, 2])), CartSnapshot::default());
        assert_eq!(CartSnapshot::from_value(json!("cart")), CartSnapshot::default());
    }

    #[test]
    fn test_wrapped_cart_is_unwrapped() {
        let snapshot = CartSnapshot::from_value(json!({
            "cart": {"id": "c-1", "products_count": 4}
        }));
        assert_eq!(snapshot.id, Some(CartId::new("c-1")));
        assert_eq!(snapshot.products_count, Some(4));
    }

    #[test]
    fn test_gift_card_details() {
        let snapshot = CartSnapshot::from_value(json!({
            "gift_card_details": {"sender_name": "Sara", "receiver_name": "Omar"}
        }));
        assert_eq!(
            snapshot.gift_card.map(|card| card.receiver_name),
            Some("Omar".to_string())
        );

        let snapshot = CartSnapshot::from_value(json!({"gift_card_details": null}));
        assert!(snapshot.gift_card.is_none());
    }

    #[test]
    fn test_wrong_typed_fields_are_ignored() {
        let snapshot = CartSnapshot::from_value(json!({
            "products": "not-a-list",
            "cart_items": {"quantity": 3},
            "totals": 12,
            "sub_total": "15.00",
            "total_price": {"amount": 1},
            "items_count": [3]
        }));
        assert!(snapshot.products.is_empty());
        assert!(snapshot.cart_items.is_empty());
        assert!(snapshot.totals.is_empty());
        assert!(snapshot.sub_total.is_none());
        assert!(snapshot.total_price.is_none());
        assert!(snapshot.items_count.is_none());
    }

    #[test]
    fn test_line_item_quantities() {
        let snapshot = CartSnapshot::from_value(json!({
            "products": [
                {"id": 11, "quantity": 2},
                {"id": "12", "quantity": "3"},
                {"quantity": -1},
                {"quantity": 2.7},
                {},
                7
            ]
        }));
        let quantities: Vec<_> = snapshot.products.iter().map(|l| l.quantity).collect();
        assert_eq!(
            quantities,
            vec![Some(2), Some(3), None, Some(2), None, None]
        );
        assert_eq!(
            snapshot.products.first().unwrap().id,
            Some(LineItemId::new("11"))
        );
    }

    #[test]
    fn test_totals_skip_non_objects() {
        let snapshot = CartSnapshot::from_value(json!({
            "totals": [null, {"code": "total", "value": "42.5", "value_string": 42.5}]
        }));
        assert_eq!(snapshot.totals.len(), 1);
        let total = snapshot.totals.first().unwrap();
        assert_eq!(total.code, "total");
        assert_eq!(total.value, Some(Decimal::new(425, 1)));
        assert_eq!(total.value_string.as_deref(), Some("42.5"));
    }

    #[test]
    fn test_price_scalar() {
        let number = PriceScalar::Number(Number::from(0));
        assert!(!number.is_set());

        let text = PriceScalar::Text("19.90".to_string());
        assert!(text.is_set());
        assert_eq!(text.display(), "19.90");
        assert_eq!(text.amount(), Decimal::new(1990, 2));

        let junk = PriceScalar::Text("n/a".to_string());
        assert!(junk.is_set());
        assert_eq!(junk.amount(), Decimal::ZERO);
    }

    #[test]
    fn test_deserialize_through_serde() {
        let snapshot: CartSnapshot =
            serde_json::from_str(r#"{"cart_items_quantity": "5"}"#).unwrap();
        assert_eq!(snapshot.cart_items_quantity, Some(5));

        let snapshot: CartSnapshot = serde_json::from_str("null").unwrap();
        assert_eq!(snapshot, CartSnapshot::default());
    }
}
