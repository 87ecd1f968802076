//! Gift card attached to a cart.
//!
//! A shopper can mark the order as a gift: sender and receiver names are
//! required, the message is optional. The storefront API returns the
//! current card as `gift_card_details` on the cart.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A gift card as stored on the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftCard {
    pub sender_name: String,
    pub receiver_name: String,
    #[serde(rename = "gift_message", default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Why a gift card was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GiftCardError {
    #[error("Enter the sender's name")]
    MissingSender,
    #[error("Enter the receiver's name")]
    MissingReceiver,
}

impl GiftCard {
    /// Build a card from form input. Fields are trimmed and a blank message
    /// counts as none.
    ///
    /// # Errors
    ///
    /// Returns [`GiftCardError`] when the sender or receiver is blank.
    pub fn new(
        sender_name: &str,
        receiver_name: &str,
        message: Option<&str>,
    ) -> Result<Self, GiftCardError> {
        let sender_name = sender_name.trim();
        let receiver_name = receiver_name.trim();

        if sender_name.is_empty() {
            return Err(GiftCardError::MissingSender);
        }
        if receiver_name.is_empty() {
            return Err(GiftCardError::MissingReceiver);
        }

        Ok(Self {
            sender_name: sender_name.to_string(),
            receiver_name: receiver_name.to_string(),
            message: message
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from),
        })
    }

    /// Read `gift_card_details` leniently. Anything without both names is
    /// treated as no card.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let text = |key: &str| value.get(key).and_then(Value::as_str).unwrap_or_default();
        let message = value.get("gift_message").and_then(Value::as_str);
        Self::new(text("sender_name"), text("receiver_name"), message).ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_trims_and_drops_blank_message() {
        let card = GiftCard::new("  Sara ", "Omar", Some("   ")).unwrap();
        assert_eq!(card.sender_name, "Sara");
        assert_eq!(card.receiver_name, "Omar");
        assert_eq!(card.message, None);
    }

    #[test]
    fn test_names_are_required() {
        assert_eq!(
            GiftCard::new(" ", "Omar", None),
            Err(GiftCardError::MissingSender)
        );
        assert_eq!(
            GiftCard::new("Sara", "", Some("hi")),
            Err(GiftCardError::MissingReceiver)
        );
    }

    #[test]
    fn test_from_value_is_lenient() {
        let card = GiftCard::from_value(&json!({
            "sender_name": "Sara",
            "receiver_name": "Omar",
            "gift_message": "Happy Eid"
        }))
        .unwrap();
        assert_eq!(card.message.as_deref(), Some("Happy Eid"));

        assert_eq!(GiftCard::from_value(&json!({"sender_name": "Sara"})), None);
        assert_eq!(GiftCard::from_value(&json!([])), None);
        assert_eq!(GiftCard::from_value(&json!({"sender_name": 5, "receiver_name": "Omar"})), None);
    }

    #[test]
    fn test_serializes_api_field_names() {
        let card = GiftCard::new("Sara", "Omar", Some("Happy Eid")).unwrap();
        assert_eq!(
            serde_json::to_value(&card).unwrap(),
            json!({"sender_name": "Sara", "receiver_name": "Omar", "gift_message": "Happy Eid"})
        );

        let card = GiftCard::new("Sara", "Omar", None).unwrap();
        assert_eq!(
            serde_json::to_value(&card).unwrap(),
            json!({"sender_name": "Sara", "receiver_name": "Omar"})
        );
    }
}
