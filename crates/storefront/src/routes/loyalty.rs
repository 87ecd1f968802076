//! Loyalty redemption route handlers.
//!
//! The cart page shows a dropdown of redemption methods. Options the
//! customer cannot afford are disabled; guests see every option disabled.
//! Logged-in customers also get their balance swapped into the page, and
//! every visitor can see the points the cart total would earn.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tower_sessions::Session;
use tracing::instrument;
use zid_theme_core::loyalty::{RedemptionOption, redemption_options};
use zid_theme_core::{CartSummary, RedemptionMethodId, lenient_decimal};

use super::cart::{cart_updated, get_cart_id, on_session_cart, require_cart_id, zid};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::OptionalCustomer;
use crate::state::AppState;
use crate::zid::ZidClient;

/// Redemption option list fragment (HTMX).
///
/// `customer_balance` is set for logged-in customers and fills the balance
/// and remaining-points displays out of band.
#[derive(Template, WebTemplate)]
#[template(path = "partials/loyalty_options.html")]
pub struct LoyaltyOptionsTemplate {
    pub options: Vec<RedemptionOption>,
    pub balance: u64,
    pub customer_balance: Option<u64>,
}

/// Points-earned swap for `[data-loyalty-calculated-points]`.
#[derive(Template)]
#[template(path = "partials/loyalty_points.html")]
pub struct CalculatedPointsTemplate {
    pub points: u64,
}

/// List redemption options for the current customer (HTMX).
#[instrument(skip(state, customer))]
pub async fn options(
    State(state): State<AppState>,
    customer: OptionalCustomer,
) -> Result<LoyaltyOptionsTemplate> {
    let client = zid(&state)?;
    let config = state.config();

    let methods = client.redemption_methods(&config.currency_code).await?;
    let customer_balance = match customer.0 {
        Some(token) => Some(client.loyalty_balance(&token).await?),
        None => None,
    };
    let balance = customer_balance.unwrap_or_default();

    Ok(LoyaltyOptionsTemplate {
        options: redemption_options(
            &methods,
            balance,
            &config.currency_code,
            config.loyalty_option_label.as_deref(),
        ),
        balance: balance.balance,
        customer_balance: customer_balance.map(|b| b.balance),
    })
}

/// Query parameters for [`points`].
#[derive(Debug, Deserialize)]
pub struct PointsQuery {
    /// Purchase total; the visitor's cart total when absent.
    pub total: Option<String>,
}

/// The session cart's total, if it can be read.
async fn session_cart_total(client: &ZidClient, session: &Session) -> Option<Decimal> {
    let cart_id = get_cart_id(session).await?;
    let result = client.get_cart(&cart_id).await;
    match on_session_cart(client, session, &cart_id, result).await {
        Ok(snapshot) => Some(CartSummary::derive(Some(&snapshot)).raw_price),
        Err(e) => {
            tracing::warn!(error = %e, "Could not read cart total for loyalty points");
            None
        }
    }
}

/// Show the points a purchase would earn (HTMX).
///
/// Best effort, like the badges: anything missing or failing answers
/// `204 No Content` and leaves the page as it is.
#[instrument(skip(state, session))]
pub async fn points(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<PointsQuery>,
) -> Response {
    let Some(client) = state.zid() else {
        return StatusCode::NO_CONTENT.into_response();
    };

    let given = query
        .total
        .and_then(|total| lenient_decimal(&Value::String(total)));
    let total = match given {
        Some(total) => Some(total),
        None => session_cart_total(client, &session).await,
    };
    let Some(total) = total else {
        return StatusCode::NO_CONTENT.into_response();
    };

    let earned = match client.calculated_points(total).await {
        Ok(earned) => earned,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to calculate loyalty points");
            return StatusCode::NO_CONTENT.into_response();
        }
    };

    match (CalculatedPointsTemplate {
        points: earned.points,
    })
    .render()
    {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render loyalty points");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

/// Apply redemption form data.
#[derive(Debug, Deserialize)]
pub struct RedemptionForm {
    pub method_id: RedemptionMethodId,
}

/// Redeem points against the cart (HTMX).
#[instrument(skip(state, session))]
pub async fn apply(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RedemptionForm>,
) -> Result<Response> {
    let client = zid(&state)?;
    let cart_id = require_cart_id(&session).await?;

    let result = client.apply_redemption(&cart_id, &form.method_id).await;
    let snapshot = on_session_cart(client, &session, &cart_id, result).await?;
    add_breadcrumb(
        "loyalty",
        "Redeemed points",
        Some(&[
            ("cart_id", cart_id.as_str()),
            ("method_id", form.method_id.as_str()),
        ]),
    );
    Ok(cart_updated(&state, &session, &cart_id, snapshot).await)
}

/// Undo a redemption (HTMX).
#[instrument(skip(state, session))]
pub async fn remove(State(state): State<AppState>, session: Session) -> Result<Response> {
    let client = zid(&state)?;
    let cart_id = require_cart_id(&session).await?;

    let result = client.remove_redemption(&cart_id).await;
    let snapshot = on_session_cart(client, &session, &cart_id, result).await?;
    Ok(cart_updated(&state, &session, &cart_id, snapshot).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_options_render_disabled() {
        let html = LoyaltyOptionsTemplate {
            options: vec![
                RedemptionOption {
                    id: RedemptionMethodId::new("m-1"),
                    label: "For 100 points get 10.00 SAR discount".to_string(),
                    disabled: false,
                },
                RedemptionOption {
                    id: RedemptionMethodId::new("m-2"),
                    label: "For 900 points get 90.00 SAR discount".to_string(),
                    disabled: true,
                },
            ],
            balance: 250,
            customer_balance: Some(250),
        }
        .render()
        .unwrap_or_default();

        assert!(html.contains(
            r#"<option value="m-1">For 100 points get 10.00 SAR discount</option>"#
        ));
        assert!(html.contains(r#"<option value="m-2" disabled>"#));
        assert!(html.contains(r#"data-loyalty-balance="250""#));
        assert!(html.contains(
            r#"<span hx-swap-oob="innerHTML:[data-loyalty-customer-points]">250</span>"#
        ));
        assert!(html.contains(
            r#"<span hx-swap-oob="innerHTML:[data-loyalty-remaining-points]">250</span>"#
        ));
    }

    #[test]
    fn test_guest_gets_no_balance_swaps() {
        let html = LoyaltyOptionsTemplate {
            options: Vec::new(),
            balance: 0,
            customer_balance: None,
        }
        .render()
        .unwrap_or_default();
        assert!(!html.contains("hx-swap-oob"));
    }

    #[test]
    fn test_calculated_points_swap() {
        let html = CalculatedPointsTemplate { points: 37 }
            .render()
            .unwrap_or_default();
        assert_eq!(
            html.trim(),
            r#"<span hx-swap-oob="innerHTML:[data-loyalty-calculated-points]">37</span>"#
        );
    }

    #[test]
    fn test_no_options_renders_placeholder() {
        let html = LoyaltyOptionsTemplate {
            options: Vec::new(),
            balance: 0,
            customer_balance: None,
        }
        .render()
        .unwrap_or_default();
        assert_eq!(html.matches("<option").count(), 1);
    }
}
