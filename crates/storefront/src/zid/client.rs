//! Zid storefront API client implementation.
//!
//! Uses `reqwest` for HTTP and parses cart bodies into [`CartSnapshot`].
//! Caches loyalty redemption methods using `moka` (5-minute TTL).

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;
use zid_theme_core::gift::GiftCard;
use zid_theme_core::loyalty::{CalculatedPoints, LoyaltyBalance, RedemptionMethod};
use zid_theme_core::{CartId, CartSnapshot, LineItemId, ProductId, RedemptionMethodId};

use super::types::{
    AddProductInput, CouponInput, ErrorBody, QuantityInput, RedemptionInput,
    RedemptionMethodsResponse,
};
use super::{CartSource, ZidError};
use crate::config::ZidApiConfig;

/// Header carrying the logged-in customer's token.
pub const CUSTOMER_TOKEN_HEADER: &str = "X-Customer-Token";

const STORE_ID_HEADER: &str = "Store-Id";
const CACHE_TTL: Duration = Duration::from_secs(300);
const ERROR_BODY_PREVIEW: usize = 200;

// =============================================================================
// ZidClient
// =============================================================================

/// Client for the Zid storefront API.
///
/// Cheap to clone; all clones share one connection pool and cache.
#[derive(Clone)]
pub struct ZidClient {
    inner: Arc<ZidClientInner>,
}

struct ZidClientInner {
    client: reqwest::Client,
    base_url: Url,
    access_token: SecretString,
    store_id: String,
    language: String,
    redemption_methods: Cache<String, Vec<RedemptionMethod>>,
}

impl std::fmt::Debug for ZidClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZidClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("store_id", &self.inner.store_id)
            .finish_non_exhaustive()
    }
}

impl ZidClient {
    /// Create a client, or `None` when no API token is configured.
    #[must_use]
    pub fn from_config(config: &ZidApiConfig) -> Option<Self> {
        let access_token = config.access_token.clone()?;

        let redemption_methods = Cache::builder()
            .max_capacity(32)
            .time_to_live(CACHE_TTL)
            .build();

        Some(Self {
            inner: Arc::new(ZidClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                access_token,
                store_id: config.store_id.clone(),
                language: config.language.clone(),
                redemption_methods,
            }),
        })
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ZidError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ZidError::InvalidBaseUrl)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request with the store's auth headers.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.inner
            .client
            .request(method, url)
            .bearer_auth(self.inner.access_token.expose_secret())
            .header(STORE_ID_HEADER, &self.inner.store_id)
            .header(reqwest::header::ACCEPT_LANGUAGE, &self.inner.language)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    /// Send a request and return its JSON body, or `None` for an empty body.
    async fn execute(&self, request: RequestBuilder) -> Result<Option<Value>, ZidError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ZidError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(ZidError::NotFound(url));
        }

        if !status.is_success() {
            if let Ok(ErrorBody { message }) = serde_json::from_str::<ErrorBody>(&body) {
                debug!(status = %status, name = %message.name, "Zid rejected request");
                return Err(ZidError::Rejected {
                    name: message.name,
                    description: message.description,
                });
            }

            tracing::error!(
                status = %status,
                path = %url,
                body = %body.chars().take(500).collect::<String>(),
                "Zid API returned non-success status"
            );
            return Err(ZidError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_PREVIEW).collect(),
            });
        }

        if body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&body).map(Some).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %url,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Zid API response"
            );
            ZidError::Parse(e)
        })
    }

    /// Execute a cart mutation; the body, when present, is the updated cart.
    async fn cart_call(&self, request: RequestBuilder) -> Result<Option<CartSnapshot>, ZidError> {
        Ok(self.execute(request).await?.map(CartSnapshot::from_value))
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Get the current state of a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart does not exist or the request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &CartId) -> Result<CartSnapshot, ZidError> {
        let url = self.endpoint(&["carts", cart_id.as_str()])?;
        self.cart_call(self.request(Method::GET, url))
            .await?
            .ok_or_else(|| ZidError::NotFound(format!("cart {cart_id}")))
    }

    /// Create a new cart holding one product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response carries no cart ID.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn create_cart(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<CartSnapshot, ZidError> {
        let url = self.endpoint(&["carts"])?;
        let request = self
            .request(Method::POST, url)
            .json(&AddProductInput {
                product_id,
                quantity,
            });

        self.cart_call(request)
            .await?
            .filter(|cart| cart.id.is_some())
            .ok_or_else(|| ZidError::Status {
                status: StatusCode::OK.as_u16(),
                body: "cart created without an id".to_string(),
            })
    }

    /// Add a product to an existing cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the product or the request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id, product_id = %product_id))]
    pub async fn add_product(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Option<CartSnapshot>, ZidError> {
        let url = self.endpoint(&["carts", cart_id.as_str(), "products"])?;
        let request = self
            .request(Method::POST, url)
            .json(&AddProductInput {
                product_id,
                quantity,
            });
        self.cart_call(request).await
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the quantity or the request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id, line_id = %line_id))]
    pub async fn set_quantity(
        &self,
        cart_id: &CartId,
        line_id: &LineItemId,
        quantity: u32,
    ) -> Result<Option<CartSnapshot>, ZidError> {
        let url = self.endpoint(&["carts", cart_id.as_str(), "products", line_id.as_str()])?;
        let request = self
            .request(Method::PATCH, url)
            .json(&QuantityInput { quantity });
        self.cart_call(request).await
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id, line_id = %line_id))]
    pub async fn remove_line(
        &self,
        cart_id: &CartId,
        line_id: &LineItemId,
    ) -> Result<Option<CartSnapshot>, ZidError> {
        let url = self.endpoint(&["carts", cart_id.as_str(), "products", line_id.as_str()])?;
        self.cart_call(self.request(Method::DELETE, url)).await
    }

    /// Apply a coupon code.
    ///
    /// # Errors
    ///
    /// Returns [`ZidError::Rejected`] for unknown or expired codes.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn apply_coupon(
        &self,
        cart_id: &CartId,
        coupon_code: &str,
    ) -> Result<Option<CartSnapshot>, ZidError> {
        let url = self.endpoint(&["carts", cart_id.as_str(), "coupons"])?;
        let request = self
            .request(Method::POST, url)
            .json(&CouponInput { coupon_code });
        self.cart_call(request).await
    }

    /// Remove the applied coupon.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn remove_coupon(&self, cart_id: &CartId) -> Result<Option<CartSnapshot>, ZidError> {
        let url = self.endpoint(&["carts", cart_id.as_str(), "coupons"])?;
        self.cart_call(self.request(Method::DELETE, url)).await
    }

    /// Attach or replace the cart's gift card.
    ///
    /// # Errors
    ///
    /// Returns [`ZidError::Rejected`] when the API refuses the card.
    #[instrument(skip(self, gift_card), fields(cart_id = %cart_id))]
    pub async fn set_gift_card(
        &self,
        cart_id: &CartId,
        gift_card: &GiftCard,
    ) -> Result<Option<CartSnapshot>, ZidError> {
        let url = self.endpoint(&["carts", cart_id.as_str(), "gift-card"])?;
        self.cart_call(self.request(Method::POST, url).json(gift_card))
            .await
    }

    /// Remove the cart's gift card.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn remove_gift_card(
        &self,
        cart_id: &CartId,
    ) -> Result<Option<CartSnapshot>, ZidError> {
        let url = self.endpoint(&["carts", cart_id.as_str(), "gift-card"])?;
        self.cart_call(self.request(Method::DELETE, url)).await
    }

    // =========================================================================
    // Loyalty Methods
    // =========================================================================

    /// Redeem loyalty points against the cart.
    ///
    /// # Errors
    ///
    /// Returns [`ZidError::Rejected`] when the customer lacks the points.
    #[instrument(skip(self), fields(cart_id = %cart_id, method_id = %method_id))]
    pub async fn apply_redemption(
        &self,
        cart_id: &CartId,
        method_id: &RedemptionMethodId,
    ) -> Result<Option<CartSnapshot>, ZidError> {
        let url = self.endpoint(&["carts", cart_id.as_str(), "redemption"])?;
        let request = self
            .request(Method::POST, url)
            .json(&RedemptionInput { id: method_id });
        self.cart_call(request).await
    }

    /// Undo a loyalty redemption.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn remove_redemption(
        &self,
        cart_id: &CartId,
    ) -> Result<Option<CartSnapshot>, ZidError> {
        let url = self.endpoint(&["carts", cart_id.as_str(), "redemption"])?;
        self.cart_call(self.request(Method::DELETE, url)).await
    }

    /// List redemption methods priced in `currency_code`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    #[instrument(skip(self))]
    pub async fn redemption_methods(
        &self,
        currency_code: &str,
    ) -> Result<Vec<RedemptionMethod>, ZidError> {
        if let Some(methods) = self.inner.redemption_methods.get(currency_code).await {
            debug!("Cache hit for redemption methods");
            return Ok(methods);
        }

        let mut url = self.endpoint(&["loyalty", "redemption-methods"])?;
        url.query_pairs_mut().append_pair("currency", currency_code);

        let methods = match self.execute(self.request(Method::GET, url)).await? {
            Some(body) => serde_json::from_value::<RedemptionMethodsResponse>(body)?.options,
            None => Vec::new(),
        };

        self.inner
            .redemption_methods
            .insert(currency_code.to_string(), methods.clone())
            .await;

        Ok(methods)
    }

    /// Points a purchase of `total` would earn.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    #[instrument(skip(self), fields(total = %total))]
    pub async fn calculated_points(&self, total: Decimal) -> Result<CalculatedPoints, ZidError> {
        let mut url = self.endpoint(&["loyalty", "calculate-points"])?;
        url.query_pairs_mut()
            .append_pair("total", &total.normalize().to_string());

        match self.execute(self.request(Method::GET, url)).await? {
            Some(body) => Ok(serde_json::from_value(body)?),
            None => Ok(CalculatedPoints::default()),
        }
    }

    /// Get the logged-in customer's point balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected or the request fails.
    #[instrument(skip(self, customer_token))]
    pub async fn loyalty_balance(&self, customer_token: &str) -> Result<LoyaltyBalance, ZidError> {
        let url = self.endpoint(&["loyalty", "points"])?;
        let request = self
            .request(Method::GET, url)
            .header(CUSTOMER_TOKEN_HEADER, customer_token);

        match self.execute(request).await? {
            Some(body) => Ok(serde_json::from_value(body)?),
            None => Ok(LoyaltyBalance::default()),
        }
    }
}

impl CartSource for ZidClient {
    async fn get_cart(&self, cart_id: &CartId) -> Result<CartSnapshot, ZidError> {
        Self::get_cart(self, cart_id).await
    }
}
