//! Session keys.
//!
//! Zid owns the cart; the session only remembers which cart belongs to the
//! visitor.

/// Session keys for visitor data.
pub mod keys {
    /// Key for storing the Zid cart ID.
    pub const CART_ID: &str = "cart_id";
}
