//! Zid Theme Core - Shared types and derivations.
//!
//! This crate provides the pure, I/O-free pieces of the Zid storefront theme.
//! The rest of the workspace builds on it:
//! - `storefront` - the HTMX service that fetches carts and renders badges
//! - `integration-tests` - end-to-end tests against a fake storefront API
//!
//! # Architecture
//!
//! The core crate contains only types and derivations - no I/O, no HTTP
//! clients, no templates. Every function here is deterministic given its
//! inputs, which keeps the cart rules testable without a page or a network.
//!
//! # Modules
//!
//! - [`cart`] - Cart snapshots and the badge summary derived from them
//! - [`types`] - Newtype wrappers for identifiers and money formatting
//! - [`quantity`] - Quantity stepper clamping rules
//! - [`loyalty`] - Loyalty redemption options and earned points
//! - [`gift`] - Gift card details attached to a cart
//! - [`time_ago`] - Relative time formatting with localizable labels

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod gift;
pub mod loyalty;
pub mod quantity;
pub mod time_ago;
pub mod types;

pub use cart::{CartSnapshot, CartSummary};
pub use types::*;
