//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Every error response carries
//! an `HX-Trigger: {"cart:error": {"message": ...}}` header so the theme can
//! show the message in a toast; server-side failures are captured to Sentry
//! first.

use std::fmt::Write;

use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use zid_theme_core::gift::GiftCardError;

use crate::zid::ZidError;

/// HTMX response header that fires client-side events.
pub const HX_TRIGGER: HeaderName = HeaderName::from_static("hx-trigger");

/// Client event fired when a cart action fails.
pub const CART_ERROR_EVENT: &str = "cart:error";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Zid storefront API call failed.
    #[error("Zid error: {0}")]
    Zid(#[from] ZidError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// No storefront API token is configured.
    #[error("Storefront API not configured")]
    NotConfigured,

    /// The visitor has no cart yet.
    #[error("No cart in session")]
    NoCart,

    /// The session's cart no longer exists upstream and has been forgotten.
    #[error("Session cart expired")]
    CartExpired,

    /// Gift card form input was incomplete.
    #[error("Invalid gift card: {0}")]
    GiftCard(#[from] GiftCardError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Zid(ZidError::Rejected { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Zid(ZidError::NotFound(_)) | Self::NoCart | Self::CartExpired => {
                StatusCode::NOT_FOUND
            }
            Self::Zid(ZidError::RateLimited(_)) => StatusCode::TOO_MANY_REQUESTS,
            Self::Zid(_) => StatusCode::BAD_GATEWAY,
            Self::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadRequest(_) | Self::GiftCard(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the shopper. Never exposes internals.
    fn public_message(&self) -> String {
        match self {
            Self::Zid(ZidError::NotFound(_)) => "This item is no longer available".to_string(),
            Self::Zid(err) => err.shopper_message().map_or_else(
                || "The store is unavailable, please try again".to_string(),
                String::from,
            ),
            Self::NotConfigured => "The store is unavailable".to_string(),
            Self::NoCart => "Your cart is empty".to_string(),
            Self::CartExpired => "Your cart has expired, please add your items again".to_string(),
            Self::BadRequest(msg) => msg.clone(),
            Self::GiftCard(err) => err.to_string(),
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let message = self.public_message();
        let trigger = hx_trigger_value(&json!({ CART_ERROR_EVENT: { "message": message } }));

        let mut response = (status, message).into_response();
        if let Some(value) = trigger {
            response.headers_mut().insert(HX_TRIGGER, value);
        }
        response
    }
}

/// Encode an `HX-Trigger` event object as a header value.
///
/// Header values must be visible ASCII, so non-ASCII characters (Arabic
/// messages) are written as JSON `\uXXXX` escapes.
#[must_use]
pub fn hx_trigger_value(events: &serde_json::Value) -> Option<HeaderValue> {
    let mut encoded = String::new();
    for ch in events.to_string().chars() {
        if ch.is_ascii() {
            encoded.push(ch);
        } else {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                let _ = write!(encoded, "\\u{unit:04x}");
            }
        }
    }
    HeaderValue::from_str(&encoded).ok()
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Applied coupon", Some(&[("cart_id", "c-1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
