//! Zid storefront API client.
//!
//! # Architecture
//!
//! - JSON over HTTPS with `reqwest`; the store is addressed by `Store-Id`
//! - Zid is the source of truth for carts: nothing is stored locally beyond
//!   the visitor's cart ID in the session
//! - Responses are parsed leniently (see [`CartSnapshot`]) because their
//!   shape differs between empty carts, guest carts and API versions
//! - Loyalty redemption methods are cached via `moka` (5 minute TTL)
//!
//! # Example
//!
//! ```rust,ignore
//! use zid_theme_storefront::zid::ZidClient;
//!
//! let client = ZidClient::from_config(&config.zid).expect("token configured");
//!
//! let cart = client.create_cart(&ProductId::new("p-1"), 1).await?;
//! let cart = client.apply_coupon(cart.id.as_ref().unwrap(), "WELCOME10").await?;
//! ```

mod client;
pub mod types;

pub use client::{CUSTOMER_TOKEN_HEADER, ZidClient};

use thiserror::Error;
use zid_theme_core::{CartId, CartSnapshot};

/// Errors that can occur when talking to the Zid storefront API.
#[derive(Debug, Error)]
pub enum ZidError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Zid.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The API refused the operation (invalid coupon, insufficient points, ...).
    #[error("Rejected: {}", .description.as_deref().unwrap_or(.name))]
    Rejected {
        name: String,
        description: Option<String>,
    },

    /// Non-success status without a recognizable error body.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The configured base URL cannot have paths appended.
    #[error("Invalid API base URL")]
    InvalidBaseUrl,
}

impl ZidError {
    /// Message safe to show the shopper, if the API provided one.
    #[must_use]
    pub fn shopper_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { name, description } => Some(description.as_deref().unwrap_or(name)),
            _ => None,
        }
    }
}

/// Anything that can produce the current cart snapshot.
///
/// Badge refreshes depend on this trait rather than on [`ZidClient`] so the
/// refresh path can be exercised with an in-memory source.
pub trait CartSource: Send + Sync {
    /// Fetch the cart identified by `cart_id`.
    fn get_cart(
        &self,
        cart_id: &CartId,
    ) -> impl Future<Output = Result<CartSnapshot, ZidError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zid_error_display() {
        let err = ZidError::NotFound("cart c-1".to_string());
        assert_eq!(err.to_string(), "Not found: cart c-1");

        let err = ZidError::RateLimited(3);
        assert_eq!(err.to_string(), "Rate limited, retry after 3 seconds");
    }

    #[test]
    fn test_rejected_prefers_description() {
        let err = ZidError::Rejected {
            name: "coupon_invalid".to_string(),
            description: Some("This coupon has expired".to_string()),
        };
        assert_eq!(err.to_string(), "Rejected: This coupon has expired");
        assert_eq!(err.shopper_message(), Some("This coupon has expired"));

        let err = ZidError::Rejected {
            name: "points_insufficient".to_string(),
            description: None,
        };
        assert_eq!(err.shopper_message(), Some("points_insufficient"));
    }

    #[test]
    fn test_transport_errors_have_no_shopper_message() {
        let err = ZidError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.shopper_message(), None);
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }
}
