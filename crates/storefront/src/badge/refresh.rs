//! Badge refresh orchestration.

use tracing::{debug, instrument, warn};
use zid_theme_core::{CartId, CartSnapshot, CartSummary};

use super::{BadgeSurface, render};
use crate::zid::{CartSource, ZidError};

/// What a refresh did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Refreshed {
    /// The rendered summary, or `None` when nothing was rendered.
    pub summary: Option<CartSummary>,
    /// The storefront API no longer knows the requested cart.
    pub cart_missing: bool,
}

/// Fetches the current cart, derives its summary and renders the badges.
///
/// Holds no state between calls: every refresh starts from a fresh
/// snapshot, so repeated or overlapping refreshes settle on the last one
/// rendered.
#[derive(Debug, Clone)]
pub struct BadgeRefresher<S> {
    source: Option<S>,
}

impl<S: CartSource> BadgeRefresher<S> {
    /// `None` means no cart source is configured; every refresh is a no-op.
    #[must_use]
    pub const fn new(source: Option<S>) -> Self {
        Self { source }
    }

    /// Whether a cart source is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.source.is_some()
    }

    /// Refresh every badge on `surface`.
    ///
    /// The fetched cart wins; `provided` is used only when the fetch fails
    /// or there is no cart to fetch. Never fails: a cart the API reports as
    /// gone is flagged in [`Refreshed::cart_missing`] so the caller can stop
    /// asking for it.
    #[instrument(skip_all, fields(cart_id = cart_id.map(CartId::as_str), provided = provided.is_some()))]
    pub async fn refresh(
        &self,
        cart_id: Option<&CartId>,
        provided: Option<CartSnapshot>,
        surface: &mut impl BadgeSurface,
    ) -> Refreshed {
        let Some(source) = &self.source else {
            debug!("No cart source configured, skipping badge refresh");
            return Refreshed::default();
        };

        let mut cart_missing = false;
        let snapshot = match cart_id {
            Some(cart_id) => match source.get_cart(cart_id).await {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    cart_missing = matches!(e, ZidError::NotFound(_));
                    warn!(error = %e, "Cart fetch failed, falling back to provided snapshot");
                    provided
                }
            },
            None => provided,
        };

        let Some(snapshot) = snapshot else {
            debug!("No cart snapshot available, leaving badges untouched");
            return Refreshed {
                summary: None,
                cart_missing,
            };
        };

        let summary = CartSummary::derive(Some(&snapshot));
        render(&summary, surface);
        Refreshed {
            summary: Some(summary),
            cart_missing,
        }
    }
}
