//! Cart snapshots and the badge summary derived from them.
//!
//! A [`CartSnapshot`] is whatever the storefront API returned for the
//! visitor's cart. Its shape varies between empty carts, guest carts and API
//! versions, so parsing is lenient and every field is optional.
//!
//! [`CartSummary::derive`] turns a snapshot into the strings the header
//! badges display. It is a pure function: the same snapshot always yields the
//! same summary.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use zid_theme_core::{CartSnapshot, CartSummary};
//!
//! let snapshot = CartSnapshot::from_value(json!({
//!     "products": [{"quantity": 2}, {"quantity": 1}],
//!     "totals": [
//!         {"code": "discount", "value": -5, "value_string": "-5.00 SAR"},
//!         {"code": "total", "value": 42, "value_string": "42.00 SAR"}
//!     ]
//! }));
//!
//! let summary = CartSummary::derive(Some(&snapshot));
//! assert_eq!(summary.pill_text, "42.00 SAR (3)");
//! assert_eq!(summary.mobile_price_text, "42.00 SAR");
//! ```

mod snapshot;
mod summary;

pub use snapshot::{CartSnapshot, LineItem, PriceScalar, SubTotal, TotalLine};
pub use summary::{CartSummary, MAX_DISPLAY_QUANTITY, quantity_display};
