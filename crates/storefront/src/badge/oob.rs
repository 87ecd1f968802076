//! HTMX out-of-band swap surface.

use askama::Template;
use serde_json::{Map, Value, json};

use super::{BadgeSlot, BadgeSurface, BadgeUpdate};

/// Client event carrying the count badge's visibility:
/// `{"cart-badge": {"hidden": true}}`.
pub const BADGE_VISIBILITY_EVENT: &str = "cart-badge";

/// Collects badge updates and renders them as `hx-swap-oob` fragments.
///
/// Every slot swaps `innerHTML` on the nodes matching its selector, so the
/// theme's own badge markup stays in place. Visibility cannot travel in an
/// inner swap; it is sent as a [`BADGE_VISIBILITY_EVENT`] trigger instead.
#[derive(Debug, Default, Template)]
#[template(path = "partials/cart_badge_swaps.html")]
pub struct OobSwaps {
    pill: Option<BadgeUpdate>,
    count: Option<BadgeUpdate>,
    price: Option<BadgeUpdate>,
}

impl OobSwaps {
    /// No slot has been updated.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pill.is_none() && self.count.is_none() && self.price.is_none()
    }

    /// Render the swap fragment, or `None` if there is nothing to swap or
    /// rendering failed. Failures are logged and reported, never raised.
    #[must_use]
    pub fn to_fragment(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        match self.render() {
            Ok(html) => Some(html),
            Err(e) => {
                crate::error::add_breadcrumb("cart", "Badge fragment render failed", None);
                let event_id = sentry::capture_error(&e);
                tracing::error!(
                    error = %e,
                    sentry_event_id = %event_id,
                    "Failed to render cart badge swaps"
                );
                None
            }
        }
    }

    /// `HX-Trigger` events that go with the fragment.
    #[must_use]
    pub fn trigger_events(&self) -> Map<String, Value> {
        let mut events = Map::new();
        if let Some(hidden) = self.count.as_ref().and_then(|count| count.hidden) {
            events.insert(
                BADGE_VISIBILITY_EVENT.to_string(),
                json!({ "hidden": hidden }),
            );
        }
        events
    }

    fn pill_selector(&self) -> String {
        BadgeSlot::DesktopPill.selector()
    }

    fn count_selector(&self) -> String {
        BadgeSlot::MobileCount.selector()
    }

    fn price_selector(&self) -> String {
        BadgeSlot::MobilePrice.selector()
    }
}

impl BadgeSurface for OobSwaps {
    fn update(&mut self, slot: BadgeSlot, update: &BadgeUpdate) {
        let target = match slot {
            BadgeSlot::DesktopPill => &mut self.pill,
            BadgeSlot::MobileCount => &mut self.count,
            BadgeSlot::MobilePrice => &mut self.price,
        };
        *target = Some(update.clone());
    }
}
