//! Quantity stepper rules shared by the product page and the cart page.
//!
//! A stepper holds an integer between a lower bound (default 1) and an
//! optional upper bound (stock). The `+`/`-` buttons move it by one, typed
//! input is clamped, and at the lower bound the `-` button is replaced by a
//! "remove" button.

use serde::{Deserialize, Serialize};

/// Inclusive bounds for a quantity input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityBounds {
    min: u32,
    max: Option<u32>,
}

impl Default for QuantityBounds {
    fn default() -> Self {
        Self {
            min: Self::DEFAULT_MIN,
            max: None,
        }
    }
}

impl QuantityBounds {
    /// Lower bound used when none is given or the given one is zero.
    pub const DEFAULT_MIN: u32 = 1;

    /// Create bounds. A zero or missing `min` falls back to [`Self::DEFAULT_MIN`].
    #[must_use]
    pub fn new(min: Option<u32>, max: Option<u32>) -> Self {
        Self {
            min: min.filter(|&m| m > 0).unwrap_or(Self::DEFAULT_MIN),
            max,
        }
    }

    #[must_use]
    pub const fn min(&self) -> u32 {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> Option<u32> {
        self.max
    }

    /// Clamp any integer into range. The lower bound wins if the bounds cross.
    #[must_use]
    pub fn clamp(&self, value: i64) -> u32 {
        let upper = self.max.map_or(value, |max| value.min(i64::from(max)));
        let clamped = upper.max(i64::from(self.min));
        u32::try_from(clamped).unwrap_or(u32::MAX)
    }

    /// Apply a `+`/`-` step. Returns `None` when the value would not change.
    #[must_use]
    pub fn step(&self, current: u32, delta: i64) -> Option<u32> {
        let next = self.clamp(i64::from(current).saturating_add(delta));
        (next != current).then_some(next)
    }
}

/// Which buttons a stepper shows for its current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepperState {
    pub value: u32,
    /// The trash button replaces `-` at the bottom of the range.
    pub show_remove: bool,
    pub show_decrease: bool,
}

impl StepperState {
    #[must_use]
    pub const fn for_value(value: u32) -> Self {
        Self {
            value,
            show_remove: value <= 1,
            show_decrease: value > 1,
        }
    }
}

/// Parse typed input the way a browser's `parseInt(..) || 1` does.
///
/// Leading whitespace and an optional sign are accepted, parsing stops at the
/// first non-digit, and anything that yields zero or no digits becomes 1.
#[must_use]
pub fn parse_quantity(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, trimmed.get(1..).unwrap_or_default()),
        Some(b'+') => (false, trimmed.get(1..).unwrap_or_default()),
        _ => (false, trimmed),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let parsed = digits
        .get(..end)
        .and_then(|d| d.parse::<i64>().ok())
        .unwrap_or(0);

    match (parsed, negative) {
        (0, _) => 1,
        (n, true) => -n,
        (n, false) => n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds() {
        let bounds = QuantityBounds::default();
        assert_eq!(bounds.min(), 1);
        assert_eq!(bounds.max(), None);
        assert_eq!(QuantityBounds::new(Some(0), None), bounds);
    }

    #[test]
    fn test_clamp() {
        let bounds = QuantityBounds::new(Some(1), Some(5));
        assert_eq!(bounds.clamp(-3), 1);
        assert_eq!(bounds.clamp(0), 1);
        assert_eq!(bounds.clamp(3), 3);
        assert_eq!(bounds.clamp(9), 5);

        let unbounded = QuantityBounds::default();
        assert_eq!(unbounded.clamp(1_000), 1_000);
    }

    #[test]
    fn test_crossed_bounds_prefer_min() {
        let bounds = QuantityBounds::new(Some(3), Some(2));
        assert_eq!(bounds.clamp(10), 3);
    }

    #[test]
    fn test_step() {
        let bounds = QuantityBounds::new(None, Some(3));
        assert_eq!(bounds.step(1, 1), Some(2));
        assert_eq!(bounds.step(3, 1), None);
        assert_eq!(bounds.step(1, -1), None);
        assert_eq!(bounds.step(2, -1), Some(1));
    }

    #[test]
    fn test_stepper_state() {
        let one = StepperState::for_value(1);
        assert!(one.show_remove);
        assert!(!one.show_decrease);

        let two = StepperState::for_value(2);
        assert!(!two.show_remove);
        assert!(two.show_decrease);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("4"), 4);
        assert_eq!(parse_quantity("  7 "), 7);
        assert_eq!(parse_quantity("3abc"), 3);
        assert_eq!(parse_quantity("-2"), -2);
        assert_eq!(parse_quantity(""), 1);
        assert_eq!(parse_quantity("0"), 1);
        assert_eq!(parse_quantity("abc"), 1);
    }
}
