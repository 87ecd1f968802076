//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Every successful action answers with out-of-band badge swaps and fires
//! `cart-updated` through `HX-Trigger`; failures go through [`AppError`],
//! which fires `cart:error` instead.

use askama::Template;
use axum::{
    Form,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tower_sessions::Session;
use tracing::instrument;
use zid_theme_core::quantity::{QuantityBounds, StepperState, parse_quantity};
use zid_theme_core::{CartId, CartSnapshot, LineItemId, ProductId};

use crate::badge::OobSwaps;
use crate::error::{AppError, HX_TRIGGER, Result, add_breadcrumb, hx_trigger_value};
use crate::models::session_keys;
use crate::state::AppState;
use crate::zid::{ZidClient, ZidError};

/// Client event fired after any cart change.
pub const CART_UPDATED_EVENT: &str = "cart-updated";

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart ID from the session.
pub(crate) async fn get_cart_id(session: &Session) -> Option<CartId> {
    session
        .get::<CartId>(session_keys::CART_ID)
        .await
        .ok()
        .flatten()
}

/// Get the cart ID from the session, or fail with [`AppError::NoCart`].
pub(crate) async fn require_cart_id(session: &Session) -> Result<CartId> {
    get_cart_id(session).await.ok_or(AppError::NoCart)
}

/// Set the cart ID in the session.
async fn set_cart_id(
    session: &Session,
    cart_id: &CartId,
) -> std::result::Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART_ID, cart_id).await
}

/// Drop the cart ID from the session.
async fn forget_cart_id(session: &Session) -> std::result::Result<(), tower_sessions::session::Error> {
    session.remove_value(session_keys::CART_ID).await.map(drop)
}

/// The Zid client, or [`AppError::NotConfigured`].
pub(crate) fn zid(state: &AppState) -> Result<&ZidClient> {
    state.zid().ok_or(AppError::NotConfigured)
}

async fn cart_is_gone(client: &ZidClient, cart_id: &CartId) -> bool {
    matches!(client.get_cart(cart_id).await, Err(ZidError::NotFound(_)))
}

/// Check the outcome of a call made against the session's cart.
///
/// A `404` can mean the cart or the line/product it names. When a re-read
/// confirms the cart itself is gone, the session forgets it and the call
/// fails with [`AppError::CartExpired`].
pub(crate) async fn on_session_cart<T>(
    client: &ZidClient,
    session: &Session,
    cart_id: &CartId,
    result: std::result::Result<T, ZidError>,
) -> Result<T> {
    let err = match result {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    if matches!(err, ZidError::NotFound(_)) && cart_is_gone(client, cart_id).await {
        tracing::info!(cart_id = %cart_id, "Session cart no longer exists, forgetting it");
        forget_cart_id(session).await?;
        return Err(AppError::CartExpired);
    }

    Err(err.into())
}

// =============================================================================
// HTMX Responses
// =============================================================================

/// Rendered badge swaps and the client events that go with them.
struct BadgeSwaps {
    html: String,
    events: Map<String, Value>,
}

/// Refresh the badges, or `None` when nothing was rendered.
///
/// A session cart the API no longer knows is forgotten so later refreshes
/// stop asking for it.
async fn refresh_badges(
    state: &AppState,
    session: &Session,
    cart_id: Option<&CartId>,
    provided: Option<CartSnapshot>,
) -> Option<BadgeSwaps> {
    let mut swaps = OobSwaps::default();
    let refreshed = state.badges().refresh(cart_id, provided, &mut swaps).await;

    if refreshed.cart_missing {
        tracing::info!("Session cart no longer exists, forgetting it");
        if let Err(e) = forget_cart_id(session).await {
            tracing::warn!(error = %e, "Failed to drop stale cart from session");
        }
    }

    refreshed.summary?;
    Some(BadgeSwaps {
        html: swaps.to_fragment()?,
        events: swaps.trigger_events(),
    })
}

/// HTML body (or `204` when empty) plus an `HX-Trigger` header for `events`.
fn htmx_response(body: String, events: Map<String, Value>) -> Response {
    let mut response = if body.is_empty() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        Html(body).into_response()
    };

    if !events.is_empty()
        && let Some(value) = hx_trigger_value(&Value::Object(events))
    {
        response.headers_mut().insert(HX_TRIGGER, value);
    }
    response
}

/// Refresh the badges and answer with their swap fragment.
///
/// `204 No Content` when nothing was rendered. Never an error status.
async fn badge_response(
    state: &AppState,
    session: &Session,
    provided: Option<CartSnapshot>,
) -> Response {
    let cart_id = get_cart_id(session).await;
    match refresh_badges(state, session, cart_id.as_ref(), provided).await {
        Some(swaps) => htmx_response(swaps.html, swaps.events),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Response to a successful cart action: `main` (the swap target's new
/// content, if any), badge swaps and the `cart-updated` trigger.
pub(crate) async fn action_response(
    state: &AppState,
    session: &Session,
    cart_id: &CartId,
    provided: Option<CartSnapshot>,
    main: Option<String>,
) -> Response {
    let (badges, mut events) = match refresh_badges(state, session, Some(cart_id), provided).await
    {
        Some(swaps) => (Some(swaps.html), swaps.events),
        None => (None, Map::new()),
    };
    events.insert(CART_UPDATED_EVENT.to_string(), json!({}));

    let body = main.into_iter().chain(badges).collect::<Vec<_>>().join("\n");
    htmx_response(body, events)
}

/// Badge swaps plus the `cart-updated` trigger, after a successful action.
pub(crate) async fn cart_updated(
    state: &AppState,
    session: &Session,
    cart_id: &CartId,
    provided: Option<CartSnapshot>,
) -> Response {
    action_response(state, session, cart_id, provided, None).await
}

/// Parse a caller-provided snapshot. Empty, `null` or malformed bodies
/// count as no snapshot.
fn provided_snapshot(body: &[u8]) -> Option<CartSnapshot> {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .filter(|value| !value.is_null())
        .map(CartSnapshot::from_value)
}

// =============================================================================
// Handlers
// =============================================================================

/// Refresh every badge from the visitor's cart (HTMX).
#[instrument(skip(state, session))]
pub async fn badge(State(state): State<AppState>, session: Session) -> Response {
    badge_response(&state, &session, None).await
}

/// Refresh every badge, falling back to the posted cart JSON (HTMX).
///
/// The theme posts the cart it already holds (for example the response of
/// a client-side cart call) so the badges update even if the refetch fails.
#[instrument(skip(state, session, body), fields(body_len = body.len()))]
pub async fn badge_with_snapshot(
    State(state): State<AppState>,
    session: Session,
    body: Bytes,
) -> Response {
    badge_response(&state, &session, provided_snapshot(&body)).await
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    /// Raw quantity input; anything unparseable counts as 1.
    pub quantity: Option<String>,
    /// Stock limit rendered on the product page.
    pub max: Option<u32>,
}

/// Create a cart holding the product and remember it in the session.
async fn start_cart(
    client: &ZidClient,
    session: &Session,
    product_id: &ProductId,
    quantity: u32,
) -> Result<(CartId, Option<CartSnapshot>)> {
    let snapshot = client.create_cart(product_id, quantity).await?;
    let cart_id = snapshot
        .id
        .clone()
        .ok_or_else(|| AppError::Internal("created cart has no id".to_string()))?;
    set_cart_id(session, &cart_id).await?;
    tracing::info!(cart_id = %cart_id, "Created cart");
    Ok((cart_id, Some(snapshot)))
}

/// Add a product to the cart (HTMX).
///
/// Creates a new cart if the visitor has none, or if the one in the session
/// no longer exists, and remembers it in the session.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let client = zid(&state)?;
    let quantity = QuantityBounds::new(None, form.max)
        .clamp(form.quantity.as_deref().map_or(1, parse_quantity));

    let existing = match get_cart_id(&session).await {
        Some(cart_id) => {
            let result = client
                .add_product(&cart_id, &form.product_id, quantity)
                .await;
            match on_session_cart(client, &session, &cart_id, result).await {
                Ok(snapshot) => Some((cart_id, snapshot)),
                Err(AppError::CartExpired) => None,
                Err(e) => return Err(e),
            }
        }
        None => None,
    };

    let (cart_id, snapshot) = match existing {
        Some(added) => added,
        None => start_cart(client, &session, &form.product_id, quantity).await?,
    };

    add_breadcrumb(
        "cart",
        "Added product",
        Some(&[
            ("cart_id", cart_id.as_str()),
            ("product_id", form.product_id.as_str()),
        ]),
    );

    Ok(cart_updated(&state, &session, &cart_id, snapshot).await)
}

/// Quantity stepper form data.
///
/// Either `delta` (the `+`/`-` buttons, applied to `current`) or `quantity`
/// (typed input) is given.
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub line_id: LineItemId,
    pub quantity: Option<String>,
    pub current: Option<String>,
    pub delta: Option<i64>,
    pub min: Option<u32>,
    pub max: Option<u32>,
}

/// Quantity stepper fragment (main swap target of the stepper form).
#[derive(Template)]
#[template(path = "partials/quantity_stepper.html")]
pub struct QuantityStepperTemplate {
    pub line_id: LineItemId,
    pub stepper: StepperState,
    pub bounds: QuantityBounds,
}

/// Step or set the quantity of a cart line (HTMX).
///
/// Responds with the re-rendered stepper plus badge swaps. A step that
/// would leave the value unchanged (already at a bound) makes no API call.
#[instrument(skip(state, session))]
pub async fn quantity(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<QuantityForm>,
) -> Result<Response> {
    let client = zid(&state)?;
    let cart_id = require_cart_id(&session).await?;
    let bounds = QuantityBounds::new(form.min, form.max);

    let target = match form.delta {
        Some(delta) => {
            let current = bounds.clamp(form.current.as_deref().map_or(1, parse_quantity));
            match bounds.step(current, delta) {
                Some(next) => next,
                None => return Ok(StatusCode::NO_CONTENT.into_response()),
            }
        }
        None => bounds.clamp(form.quantity.as_deref().map_or(1, parse_quantity)),
    };

    let result = client
        .set_quantity(&cart_id, &form.line_id, target)
        .await;
    let snapshot = on_session_cart(client, &session, &cart_id, result).await?;

    let stepper = QuantityStepperTemplate {
        line_id: form.line_id,
        stepper: StepperState::for_value(target),
        bounds,
    }
    .render()
    .map_err(|e| AppError::Internal(format!("stepper render failed: {e}")))?;

    Ok(action_response(&state, &session, &cart_id, snapshot, Some(stepper)).await)
}

/// Remove line form data.
#[derive(Debug, Deserialize)]
pub struct RemoveLineForm {
    pub line_id: LineItemId,
}

/// Remove a line from the cart (HTMX).
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveLineForm>,
) -> Result<Response> {
    let client = zid(&state)?;
    let cart_id = require_cart_id(&session).await?;

    let result = client.remove_line(&cart_id, &form.line_id).await;
    let snapshot = on_session_cart(client, &session, &cart_id, result).await?;
    Ok(cart_updated(&state, &session, &cart_id, snapshot).await)
}

/// Coupon form data.
#[derive(Debug, Deserialize)]
pub struct CouponForm {
    pub coupon_code: String,
}

/// Apply a coupon code (HTMX).
#[instrument(skip(state, session))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CouponForm>,
) -> Result<Response> {
    let client = zid(&state)?;
    let cart_id = require_cart_id(&session).await?;

    let code = form.coupon_code.trim();
    if code.is_empty() {
        return Err(AppError::BadRequest("Enter a coupon code".to_string()));
    }

    let result = client.apply_coupon(&cart_id, code).await;
    let snapshot = on_session_cart(client, &session, &cart_id, result).await?;
    add_breadcrumb("cart", "Applied coupon", Some(&[("cart_id", cart_id.as_str())]));
    Ok(cart_updated(&state, &session, &cart_id, snapshot).await)
}

/// Remove the applied coupon (HTMX).
#[instrument(skip(state, session))]
pub async fn remove_coupon(State(state): State<AppState>, session: Session) -> Result<Response> {
    let client = zid(&state)?;
    let cart_id = require_cart_id(&session).await?;

    let result = client.remove_coupon(&cart_id).await;
    let snapshot = on_session_cart(client, &session, &cart_id, result).await?;
    Ok(cart_updated(&state, &session, &cart_id, snapshot).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provided_snapshot_parsing() {
        assert!(provided_snapshot(b"").is_none());
        assert!(provided_snapshot(b"null").is_none());
        assert!(provided_snapshot(b"{not json").is_none());

        let snapshot = provided_snapshot(br#"{"cart": {"items_count": 2}}"#);
        assert_eq!(snapshot.and_then(|s| s.items_count), Some(2));
    }

    #[test]
    fn test_stepper_template_renders_state() {
        let html = QuantityStepperTemplate {
            line_id: LineItemId::new("l-1"),
            stepper: StepperState::for_value(1),
            bounds: QuantityBounds::new(None, Some(5)),
        }
        .render()
        .unwrap_or_default();

        assert!(html.contains(r#"value="1""#));
        assert!(html.contains("data-stepper-remove"));
        assert!(!html.contains("data-stepper-decrease"));
        assert!(html.contains(r#"max="5""#));
    }

    #[test]
    fn test_htmx_response_merges_events() {
        let mut events = Map::new();
        events.insert(CART_UPDATED_EVENT.to_string(), json!({}));
        events.insert("cart-badge".to_string(), json!({"hidden": true}));

        let response = htmx_response("<span></span>".to_string(), events);
        assert_eq!(response.status(), StatusCode::OK);
        let header = response
            .headers()
            .get(HX_TRIGGER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert_eq!(
            serde_json::from_str::<Value>(header).ok(),
            Some(json!({"cart-updated": {}, "cart-badge": {"hidden": true}}))
        );
    }

    #[test]
    fn test_htmx_response_without_body_or_events() {
        let response = htmx_response(String::new(), Map::new());
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(HX_TRIGGER).is_none());
    }
}
