//! Newtype IDs for type-safe references to storefront resources.
//!
//! The storefront API hands out identifiers as either JSON strings or JSON
//! numbers depending on the endpoint. Every ID here is stored as a string and
//! deserializes from both shapes.

use serde::{Deserialize, Deserializer};

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize` as a plain string, `Deserialize` from a string or a number
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<String>` / `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use zid_theme_core::define_id;
/// define_id!(CouponId);
/// define_id!(BranchId);
///
/// let coupon = CouponId::new("42");
/// let branch = BranchId::new("42");
///
/// // These are different types, so this won't compile:
/// // let _: CouponId = branch;
/// assert_eq!(coupon.as_str(), branch.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, ::serde::Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                $crate::types::id::string_or_number(deserializer).map(Self)
            }
        }
    };
}

define_id!(CartId);
define_id!(LineItemId);
define_id!(ProductId);
define_id!(RedemptionMethodId);

/// Deserialize a JSON string or number into a `String`.
///
/// Used by [`define_id!`]; public so the macro can reach it from other crates.
///
/// # Errors
///
/// Returns an error if the value is neither a string nor a number.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(s) => Ok(s),
        Raw::Number(n) => Ok(n.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_string_and_number() {
        let from_str: CartId = serde_json::from_str("\"abc-123\"").unwrap();
        assert_eq!(from_str.as_str(), "abc-123");

        let from_num: LineItemId = serde_json::from_str("98765").unwrap();
        assert_eq!(from_num.as_str(), "98765");
    }

    #[test]
    fn test_id_rejects_other_shapes() {
        assert!(serde_json::from_str::<ProductId>("true").is_err());
        assert!(serde_json::from_str::<ProductId>("[1]").is_err());
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = RedemptionMethodId::new("7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"7\"");
        assert_eq!(id.to_string(), "7");
    }
}
