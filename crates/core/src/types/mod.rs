//! Core types for the Zid theme.
//!
//! This module provides type-safe wrappers for identifiers and money values
//! exchanged with the storefront API.

pub mod id;
pub mod price;

pub use id::*;
pub use price::{format_fixed2, js_number_string, lenient_decimal};
