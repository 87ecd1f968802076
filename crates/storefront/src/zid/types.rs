//! Request and response bodies for the Zid storefront API.

use serde::{Deserialize, Serialize};
use zid_theme_core::{ProductId, RedemptionMethodId, loyalty::RedemptionMethod};

/// Body for adding a product to a cart (or creating a cart with it).
#[derive(Debug, Clone, Serialize)]
pub struct AddProductInput<'a> {
    pub product_id: &'a ProductId,
    pub quantity: u32,
}

/// Body for changing a line's quantity.
#[derive(Debug, Clone, Serialize)]
pub struct QuantityInput {
    pub quantity: u32,
}

/// Body for applying a coupon.
#[derive(Debug, Clone, Serialize)]
pub struct CouponInput<'a> {
    pub coupon_code: &'a str,
}

/// Body for applying a loyalty redemption method.
#[derive(Debug, Clone, Serialize)]
pub struct RedemptionInput<'a> {
    pub id: &'a RedemptionMethodId,
}

/// Response listing redemption methods.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedemptionMethodsResponse {
    #[serde(default)]
    pub options: Vec<RedemptionMethod>,
}

/// Error envelope: `{"message": {"name": ..., "description": ...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub message: ErrorMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_body_parses() {
        let body: ErrorBody = serde_json::from_value(json!({
            "message": {"name": "coupon_invalid", "description": "Coupon expired"}
        }))
        .unwrap();
        assert_eq!(body.message.name, "coupon_invalid");
        assert_eq!(body.message.description.as_deref(), Some("Coupon expired"));
    }

    #[test]
    fn test_redemption_methods_default_to_empty() {
        let body: RedemptionMethodsResponse = serde_json::from_value(json!({})).unwrap();
        assert!(body.options.is_empty());
    }

    #[test]
    fn test_inputs_serialize() {
        let product = ProductId::new("p-9");
        let body = serde_json::to_value(AddProductInput {
            product_id: &product,
            quantity: 2,
        })
        .unwrap();
        assert_eq!(body, json!({"product_id": "p-9", "quantity": 2}));
    }
}
