//! Gift card route handlers.
//!
//! The cart page lets the shopper mark the order as a gift. The form is
//! fetched into a dialog (`gift-open` / `gift-edit`), saving or deleting the
//! card refreshes the `[data-gift-card]` summary out of band.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, response::Response};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use zid_theme_core::gift::GiftCard;

use super::cart::{action_response, get_cart_id, on_session_cart, require_cart_id, zid};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

/// Gift card form, prefilled from the cart's current card (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/gift_card_form.html")]
pub struct GiftCardFormTemplate {
    pub gift_card: Option<GiftCard>,
}

/// Out-of-band replacement for the `[data-gift-card]` summary.
#[derive(Template)]
#[template(path = "partials/gift_card_summary.html")]
pub struct GiftCardSummaryTemplate {
    pub gift_card: Option<GiftCard>,
}

impl GiftCardSummaryTemplate {
    fn to_html(&self) -> Result<String> {
        self.render()
            .map_err(|e| AppError::Internal(format!("gift card render failed: {e}")))
    }
}

/// Show the gift card form (HTMX).
///
/// Visitors without a cart, or whose cart has expired, get an empty form.
#[instrument(skip(state, session))]
pub async fn form(State(state): State<AppState>, session: Session) -> Result<GiftCardFormTemplate> {
    let client = zid(&state)?;

    let gift_card = match get_cart_id(&session).await {
        Some(cart_id) => {
            let result = client.get_cart(&cart_id).await;
            match on_session_cart(client, &session, &cart_id, result).await {
                Ok(snapshot) => snapshot.gift_card,
                Err(AppError::CartExpired) => None,
                Err(e) => return Err(e),
            }
        }
        None => None,
    };

    Ok(GiftCardFormTemplate { gift_card })
}

/// Gift card form data.
#[derive(Debug, Deserialize)]
pub struct GiftCardForm {
    pub sender_name: String,
    pub receiver_name: String,
    pub gift_message: Option<String>,
}

/// Attach or replace the cart's gift card (HTMX).
#[instrument(skip(state, session, form))]
pub async fn save(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<GiftCardForm>,
) -> Result<Response> {
    let client = zid(&state)?;
    let cart_id = require_cart_id(&session).await?;
    let gift_card = GiftCard::new(
        &form.sender_name,
        &form.receiver_name,
        form.gift_message.as_deref(),
    )?;

    let result = client.set_gift_card(&cart_id, &gift_card).await;
    let snapshot = on_session_cart(client, &session, &cart_id, result).await?;
    add_breadcrumb("cart", "Saved gift card", Some(&[("cart_id", cart_id.as_str())]));

    // Prefer what the API stored; fall back to what was submitted
    let shown = snapshot
        .as_ref()
        .and_then(|cart| cart.gift_card.clone())
        .unwrap_or(gift_card);
    let summary = GiftCardSummaryTemplate {
        gift_card: Some(shown),
    }
    .to_html()?;

    Ok(action_response(&state, &session, &cart_id, snapshot, Some(summary)).await)
}

/// Remove the cart's gift card (HTMX).
#[instrument(skip(state, session))]
pub async fn remove(State(state): State<AppState>, session: Session) -> Result<Response> {
    let client = zid(&state)?;
    let cart_id = require_cart_id(&session).await?;

    let result = client.remove_gift_card(&cart_id).await;
    let snapshot = on_session_cart(client, &session, &cart_id, result).await?;
    let summary = GiftCardSummaryTemplate { gift_card: None }.to_html()?;

    Ok(action_response(&state, &session, &cart_id, snapshot, Some(summary)).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn card() -> GiftCard {
        GiftCard::new("Sara", "Omar", Some("Happy <Eid>")).unwrap()
    }

    #[test]
    fn test_form_is_prefilled() {
        let html = GiftCardFormTemplate {
            gift_card: Some(card()),
        }
        .render()
        .unwrap();

        assert!(html.contains(r#"name="sender_name" value="Sara""#));
        assert!(html.contains(r#"name="receiver_name" value="Omar""#));
        assert!(html.contains("data-action=\"gift-delete\""));
        assert!(!html.contains("<Eid>"));
    }

    #[test]
    fn test_empty_form_has_no_delete() {
        let html = GiftCardFormTemplate { gift_card: None }.render().unwrap();
        assert!(html.contains(r#"name="sender_name" value="""#));
        assert!(!html.contains("gift-delete"));
    }

    #[test]
    fn test_summary_swaps_gift_card_slot() {
        let html = GiftCardSummaryTemplate {
            gift_card: Some(card()),
        }
        .to_html()
        .unwrap();
        assert!(html.contains(r#"hx-swap-oob="innerHTML:[data-gift-card]""#));
        assert!(html.contains("Sara"));
        assert!(html.contains("data-action=\"gift-edit\""));

        let cleared = GiftCardSummaryTemplate { gift_card: None }.to_html().unwrap();
        assert!(cleared.contains(r#"hx-swap-oob="innerHTML:[data-gift-card]""#));
        assert!(!cleared.contains("Sara"));
    }
}
