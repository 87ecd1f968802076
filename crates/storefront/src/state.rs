//! Application state shared across handlers.

use std::sync::Arc;

use crate::badge::BadgeRefresher;
use crate::config::ThemeConfig;
use crate::zid::ZidClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration and the Zid storefront client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ThemeConfig,
    zid: Option<ZidClient>,
    badges: BadgeRefresher<ZidClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Without an API token the Zid client is absent: badge refreshes
    /// become no-ops and cart actions answer 503.
    #[must_use]
    pub fn new(config: ThemeConfig) -> Self {
        let zid = ZidClient::from_config(&config.zid);
        if zid.is_none() {
            tracing::warn!("ZID_API_TOKEN not set, cart badges will not refresh");
        }
        let badges = BadgeRefresher::new(zid.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                zid,
                badges,
            }),
        }
    }

    /// Get a reference to the theme configuration.
    #[must_use]
    pub fn config(&self) -> &ThemeConfig {
        &self.inner.config
    }

    /// Get the Zid storefront client, if configured.
    #[must_use]
    pub fn zid(&self) -> Option<&ZidClient> {
        self.inner.zid.as_ref()
    }

    /// Get the badge refresher.
    #[must_use]
    pub fn badges(&self) -> &BadgeRefresher<ZidClient> {
        &self.inner.badges
    }
}
