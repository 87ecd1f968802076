//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//! GET  /time-ago?date=         - Relative time label (text)
//!
//! # Cart (HTMX fragments)
//! GET  /cart/badge             - Badge swaps from the visitor's cart
//! POST /cart/badge             - Badge swaps, falling back to the posted cart JSON
//! POST /cart/add               - Add to cart (creates the cart on first add)
//! POST /cart/quantity          - Step or set a line quantity (stepper fragment)
//! POST /cart/remove            - Remove a line
//! POST /cart/coupon            - Apply coupon
//! POST /cart/coupon/remove     - Remove coupon
//!
//! # Gift card
//! GET  /cart/gift              - Gift card form, prefilled from the cart
//! POST /cart/gift              - Attach or replace the gift card
//! POST /cart/gift/remove       - Remove the gift card
//!
//! # Loyalty
//! GET  /cart/loyalty/options   - Redemption option list (fragment)
//! POST /cart/loyalty/apply     - Redeem points
//! POST /cart/loyalty/remove    - Undo redemption
//! GET  /cart/loyalty/points    - Points earned for ?total= or the cart total
//! ```
//!
//! Badge routes answer `204 No Content` when there is nothing to render.
//! Cart actions fire `cart-updated` on success and `cart:error` on failure.

pub mod cart;
pub mod gift;
pub mod loyalty;
pub mod time_ago;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the loyalty routes router.
pub fn loyalty_routes() -> Router<AppState> {
    Router::new()
        .route("/options", get(loyalty::options))
        .route("/apply", post(loyalty::apply))
        .route("/remove", post(loyalty::remove))
        .route("/points", get(loyalty::points))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/badge", get(cart::badge).post(cart::badge_with_snapshot))
        .route("/add", post(cart::add))
        .route("/quantity", post(cart::quantity))
        .route("/remove", post(cart::remove))
        .route("/coupon", post(cart::apply_coupon))
        .route("/coupon/remove", post(cart::remove_coupon))
        .route("/gift", get(gift::form).post(gift::save))
        .route("/gift/remove", post(gift::remove))
        .nest("/loyalty", loyalty_routes())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/time-ago", get(time_ago::time_ago))
        .nest("/cart", cart_routes())
}
