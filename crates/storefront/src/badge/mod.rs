//! Cart badge rendering.
//!
//! The page carries three kinds of badge node, each addressed by a data
//! attribute:
//!
//! | Slot                       | Attribute               | Shows                 |
//! |----------------------------|-------------------------|-----------------------|
//! | [`BadgeSlot::DesktopPill`] | `data-cart-badge-text`  | `pill_text`           |
//! | [`BadgeSlot::MobileCount`] | `data-cart-badge`       | `quantity_display`    |
//! | [`BadgeSlot::MobilePrice`] | `data-cart-badge-price` | `mobile_price_text`   |
//!
//! Any of them may appear zero or more times. [`render`] writes the same
//! update to every node of a slot through a [`BadgeSurface`]; the storefront
//! uses [`OobSwaps`], which turns the updates into HTMX out-of-band swaps.

mod oob;
mod refresh;

pub use oob::{BADGE_VISIBILITY_EVENT, OobSwaps};
pub use refresh::{BadgeRefresher, Refreshed};

use zid_theme_core::CartSummary;

/// A kind of badge node on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeSlot {
    /// Desktop header pill: `"<price> (<count>)"`.
    DesktopPill,
    /// Mobile count bubble, hidden when the cart is empty.
    MobileCount,
    /// Mobile price label.
    MobilePrice,
}

impl BadgeSlot {
    /// Every slot, in render order.
    pub const ALL: [Self; 3] = [Self::DesktopPill, Self::MobileCount, Self::MobilePrice];

    /// The data attribute marking nodes of this slot.
    #[must_use]
    pub const fn attribute(self) -> &'static str {
        match self {
            Self::DesktopPill => "data-cart-badge-text",
            Self::MobileCount => "data-cart-badge",
            Self::MobilePrice => "data-cart-badge-price",
        }
    }

    /// CSS attribute selector for this slot, e.g. `[data-cart-badge]`.
    #[must_use]
    pub fn selector(self) -> String {
        format!("[{}]", self.attribute())
    }
}

/// New content for every node of one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeUpdate {
    pub text: String,
    /// `Some` sets visibility; `None` leaves it alone.
    pub hidden: Option<bool>,
}

impl BadgeUpdate {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hidden: None,
        }
    }

    /// Whether the nodes should carry the `hidden` attribute.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden.unwrap_or(false)
    }
}

/// Somewhere badge nodes live.
pub trait BadgeSurface {
    /// Apply `update` to every node of `slot`. No nodes means no writes.
    fn update(&mut self, slot: BadgeSlot, update: &BadgeUpdate);
}

/// Project a summary onto every badge node of the surface.
pub fn render(summary: &CartSummary, surface: &mut impl BadgeSurface) {
    surface.update(BadgeSlot::DesktopPill, &BadgeUpdate::text(&summary.pill_text));
    surface.update(
        BadgeSlot::MobileCount,
        &BadgeUpdate {
            text: summary.quantity_display.clone(),
            hidden: Some(summary.total_quantity == 0),
        },
    );
    surface.update(
        BadgeSlot::MobilePrice,
        &BadgeUpdate::text(&summary.mobile_price_text),
    );
}

/// A single badge node held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadgeNode {
    pub text: String,
    pub hidden: bool,
}

/// In-memory page: any number of nodes per slot.
///
/// Mirrors what the browser does with the swap fragment, which makes it the
/// reference surface for rendering tests.
#[derive(Debug, Clone, Default)]
pub struct BadgeNodes {
    nodes: Vec<(BadgeSlot, BadgeNode)>,
    writes: usize,
}

impl BadgeNodes {
    /// Page with `count` nodes of each slot, in their initial state.
    #[must_use]
    pub fn with_counts(pill: usize, count: usize, price: usize) -> Self {
        let nodes = [
            (BadgeSlot::DesktopPill, pill),
            (BadgeSlot::MobileCount, count),
            (BadgeSlot::MobilePrice, price),
        ]
        .into_iter()
        .flat_map(|(slot, n)| std::iter::repeat_n((slot, BadgeNode::default()), n))
        .collect();

        Self { nodes, writes: 0 }
    }

    /// Nodes of one slot, in page order.
    pub fn nodes(&self, slot: BadgeSlot) -> impl Iterator<Item = &BadgeNode> {
        self.nodes
            .iter()
            .filter(move |(s, _)| *s == slot)
            .map(|(_, node)| node)
    }

    /// Total node writes so far.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.writes
    }
}

impl BadgeSurface for BadgeNodes {
    fn update(&mut self, slot: BadgeSlot, update: &BadgeUpdate) {
        for (_, node) in self.nodes.iter_mut().filter(|(s, _)| *s == slot) {
            node.text.clone_from(&update.text);
            if let Some(hidden) = update.hidden {
                node.hidden = hidden;
            }
            self.writes += 1;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use zid_theme_core::CartSnapshot;

    fn summary(body: serde_json::Value) -> CartSummary {
        CartSummary::derive(Some(&CartSnapshot::from_value(body)))
    }

    #[test]
    fn test_attributes_and_selectors() {
        assert_eq!(BadgeSlot::MobileCount.attribute(), "data-cart-badge");
        assert_eq!(BadgeSlot::DesktopPill.selector(), "[data-cart-badge-text]");
        assert_eq!(BadgeSlot::MobilePrice.selector(), "[data-cart-badge-price]");
    }

    #[test]
    fn test_every_node_gets_the_same_update() {
        let mut page = BadgeNodes::with_counts(2, 3, 1);
        render(
            &summary(json!({
                "products": [{"quantity": 2}],
                "totals": [{"code": "total", "value": 120, "value_string": "120.00 SAR"}]
            })),
            &mut page,
        );

        assert!(
            page.nodes(BadgeSlot::DesktopPill)
                .all(|n| n.text == "120.00 SAR (2)")
        );
        assert!(
            page.nodes(BadgeSlot::MobileCount)
                .all(|n| n.text == "2" && !n.hidden)
        );
        assert_eq!(page.nodes(BadgeSlot::MobileCount).count(), 3);
        assert!(
            page.nodes(BadgeSlot::MobilePrice)
                .all(|n| n.text == "120.00 SAR")
        );
        assert_eq!(page.writes(), 6);
    }

    #[test]
    fn test_empty_cart_hides_count_badge() {
        let mut page = BadgeNodes::with_counts(1, 1, 1);
        render(&CartSummary::derive(None), &mut page);

        let count = page.nodes(BadgeSlot::MobileCount).next().unwrap();
        assert!(count.hidden);
        assert_eq!(count.text, "0");
        assert_eq!(page.nodes(BadgeSlot::DesktopPill).next().unwrap().text, "0");
        assert_eq!(
            page.nodes(BadgeSlot::MobilePrice).next().unwrap().text,
            "0.00"
        );
    }

    #[test]
    fn test_count_badge_unhides_when_items_arrive() {
        let mut page = BadgeNodes::with_counts(0, 1, 0);
        render(&CartSummary::derive(None), &mut page);
        render(&summary(json!({"items_count": 12})), &mut page);

        let count = page.nodes(BadgeSlot::MobileCount).next().unwrap();
        assert!(!count.hidden);
        assert_eq!(count.text, "9+");
    }

    #[test]
    fn test_page_without_badges_is_untouched() {
        let mut page = BadgeNodes::default();
        render(&summary(json!({"products": [{"quantity": 1}]})), &mut page);
        assert_eq!(page.writes(), 0);
    }

    #[test]
    fn test_rendering_twice_is_stable() {
        let snapshot = summary(json!({"cart_items": [{"quantity": 4}], "total_price": "80"}));
        let mut once = BadgeNodes::with_counts(1, 1, 1);
        render(&snapshot, &mut once);
        let mut twice = once.clone();
        render(&snapshot, &mut twice);

        for slot in BadgeSlot::ALL {
            assert!(once.nodes(slot).eq(twice.nodes(slot)));
        }
    }
}
