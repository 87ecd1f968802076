//! Integration tests for the Zid theme storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p zid-theme-integration-tests
//! ```
//!
//! No external services are needed: [`FakeZid`] serves an in-memory version
//! of the Zid storefront API on an ephemeral port, and [`TestApp`] drives
//! the real storefront router with `tower::ServiceExt::oneshot`, carrying
//! the session cookie between requests like a browser would.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, Method, Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;
use zid_theme_core::time_ago::TimeAgoLabels;
use zid_theme_storefront::config::{ThemeConfig, ZidApiConfig};
use zid_theme_storefront::state::AppState;

/// Store ID the storefront is configured with.
pub const STORE_ID: &str = "store-42";

/// API token the storefront is configured with.
pub const API_TOKEN: &str = "test-api-token";

/// Customer token [`FakeZid`] accepts for loyalty calls.
pub const CUSTOMER_TOKEN: &str = "customer-token-1";

/// Coupon code [`FakeZid`] accepts.
pub const VALID_COUPON: &str = "WELCOME10";

/// Unit price of every product in [`FakeZid`].
const UNIT_PRICE: u64 = 25;

// =============================================================================
// Fake Zid API
// =============================================================================

/// A request seen by [`FakeZid`].
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: Method,
    pub path: String,
    pub store_id: Option<String>,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct FakeZidState {
    carts: HashMap<String, Value>,
    next_cart: u64,
    next_line: u64,
    fail_cart_reads: bool,
    requests: Vec<SeenRequest>,
}

type Shared = Arc<Mutex<FakeZidState>>;

/// In-memory Zid storefront API served over HTTP.
#[derive(Clone)]
pub struct FakeZid {
    state: Shared,
    addr: SocketAddr,
}

impl FakeZid {
    /// Start the fake API on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state = Shared::default();

        let api = Router::new()
            .route("/carts", post(create_cart))
            .route("/carts/{cart_id}", get(get_cart))
            .route("/carts/{cart_id}/products", post(add_product))
            .route(
                "/carts/{cart_id}/products/{line_id}",
                patch(set_quantity).delete(remove_line),
            )
            .route(
                "/carts/{cart_id}/coupons",
                post(apply_coupon).delete(remove_coupon),
            )
            .route(
                "/carts/{cart_id}/redemption",
                post(apply_redemption).delete(remove_redemption),
            )
            .route(
                "/carts/{cart_id}/gift-card",
                post(set_gift_card).delete(remove_gift_card),
            )
            .route("/loyalty/redemption-methods", get(redemption_methods))
            .route("/loyalty/points", get(loyalty_points))
            .route("/loyalty/calculate-points", get(calculate_points));

        let app = Router::new()
            .nest("/v1", api)
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                record_request,
            ))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake Zid listener");
        let addr = listener.local_addr().expect("fake Zid address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self { state, addr }
    }

    /// Base URL the storefront should use.
    ///
    /// # Panics
    ///
    /// Never in practice; the address is always a valid URL.
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/v1", self.addr)).expect("valid fake Zid URL")
    }

    fn lock(&self) -> MutexGuard<'_, FakeZidState> {
        self.state.lock().expect("fake Zid state poisoned")
    }

    /// Make every `GET /carts/{id}` answer 500.
    pub fn fail_cart_reads(&self, fail: bool) {
        self.lock().fail_cart_reads = fail;
    }

    /// Insert a cart directly, returning its ID.
    pub fn seed_cart(&self, cart: Value) -> String {
        let mut state = self.lock();
        state.next_cart += 1;
        let id = format!("cart-{}", state.next_cart);
        let mut cart = cart;
        cart["id"] = json!(id);
        state.carts.insert(id.clone(), cart);
        id
    }

    /// Drop every cart, as if they had all expired.
    pub fn expire_carts(&self) {
        self.lock().carts.clear();
    }

    /// Current state of a cart.
    #[must_use]
    pub fn cart(&self, cart_id: &str) -> Option<Value> {
        self.lock().carts.get(cart_id).cloned()
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.lock().requests.clone()
    }
}

async fn record_request(
    State(state): State<Shared>,
    request: Request<Body>,
    next: axum::middleware::Next,
) -> Response {
    let seen = {
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        SeenRequest {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            store_id: header("store-id"),
            authorization: header("authorization"),
        }
    };
    if let Ok(mut state) = state.lock() {
        state.requests.push(seen);
    }
    next.run(request).await
}

/// Recompute the derived fields the way Zid would.
fn recompute(cart: &mut Value) {
    let quantity: u64 = cart["products"]
        .as_array()
        .map(|lines| lines.iter().filter_map(|l| l["quantity"].as_u64()).sum())
        .unwrap_or(0);
    let discount = cart["discount"].as_u64().unwrap_or(0);
    let total = (quantity * UNIT_PRICE).saturating_sub(discount);

    cart["products_count"] = json!(quantity);
    let sub_total = quantity * UNIT_PRICE;
    cart["totals"] = json!([
        {"code": "sub_total", "value": sub_total, "value_string": format!("{sub_total}.00 SAR")},
        {"code": "total", "value": total, "value_string": format!("{total}.00 SAR")},
    ]);
}

fn rejected(name: &str, description: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({"message": {"name": name, "description": description}})),
    )
        .into_response()
}

fn wrapped(cart: &Value) -> Response {
    Json(json!({ "cart": cart })).into_response()
}

/// Apply `change` to a stored cart and answer with the updated cart.
fn with_cart(state: &Shared, cart_id: &str, change: impl FnOnce(&mut Value)) -> Response {
    let Ok(mut state) = state.lock() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let Some(cart) = state.carts.get_mut(cart_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    change(cart);
    recompute(cart);
    wrapped(cart)
}

fn new_line(state: &mut FakeZidState, product_id: &Value, quantity: &Value) -> Value {
    state.next_line += 1;
    json!({
        "id": format!("line-{}", state.next_line),
        "product_id": product_id,
        "quantity": quantity.as_u64().unwrap_or(1),
    })
}

async fn create_cart(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let Ok(mut state) = state.lock() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    state.next_cart += 1;
    let id = format!("cart-{}", state.next_cart);
    let line = new_line(&mut state, &body["product_id"], &body["quantity"]);
    let mut cart = json!({"id": id, "products": [line]});
    recompute(&mut cart);
    state.carts.insert(id, cart.clone());
    wrapped(&cart)
}

async fn get_cart(State(state): State<Shared>, Path(cart_id): Path<String>) -> Response {
    let Ok(state) = state.lock() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    if state.fail_cart_reads {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }
    state
        .carts
        .get(&cart_id)
        .map_or_else(|| StatusCode::NOT_FOUND.into_response(), wrapped)
}

async fn add_product(
    State(state): State<Shared>,
    Path(cart_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let line = {
        let Ok(mut guard) = state.lock() else {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        };
        new_line(&mut guard, &body["product_id"], &body["quantity"])
    };
    with_cart(&state, &cart_id, |cart| {
        if let Some(lines) = cart["products"].as_array_mut() {
            lines.push(line);
        }
    })
}

async fn set_quantity(
    State(state): State<Shared>,
    Path((cart_id, line_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    with_cart(&state, &cart_id, |cart| {
        if let Some(lines) = cart["products"].as_array_mut() {
            for line in lines.iter_mut().filter(|l| l["id"] == json!(line_id)) {
                line["quantity"] = body["quantity"].clone();
            }
        }
    })
}

async fn remove_line(
    State(state): State<Shared>,
    Path((cart_id, line_id)): Path<(String, String)>,
) -> Response {
    let known = state.lock().is_ok_and(|state| {
        state.carts.get(&cart_id).is_none_or(|cart| {
            cart["products"]
                .as_array()
                .is_some_and(|lines| lines.iter().any(|l| l["id"] == json!(line_id)))
        })
    });
    if !known {
        return StatusCode::NOT_FOUND.into_response();
    }
    with_cart(&state, &cart_id, |cart| {
        if let Some(lines) = cart["products"].as_array_mut() {
            lines.retain(|l| l["id"] != json!(line_id));
        }
    })
}

async fn apply_coupon(
    State(state): State<Shared>,
    Path(cart_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if body["coupon_code"] != json!(VALID_COUPON) {
        return rejected("coupon_invalid", "Coupon is not valid");
    }
    with_cart(&state, &cart_id, |cart| {
        cart["coupon"] = json!(VALID_COUPON);
        cart["discount"] = json!(10);
    })
}

async fn remove_coupon(State(state): State<Shared>, Path(cart_id): Path<String>) -> Response {
    with_cart(&state, &cart_id, |cart| {
        cart["coupon"] = Value::Null;
        cart["discount"] = json!(0);
    })
}

async fn apply_redemption(
    State(state): State<Shared>,
    Path(cart_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if body["id"] != json!("method-small") {
        return rejected("points_insufficient", "Not enough points");
    }
    with_cart(&state, &cart_id, |cart| {
        cart["redemption"] = body["id"].clone();
        cart["discount"] = json!(5);
    })
}

async fn remove_redemption(State(state): State<Shared>, Path(cart_id): Path<String>) -> Response {
    with_cart(&state, &cart_id, |cart| {
        cart["redemption"] = Value::Null;
        cart["discount"] = json!(0);
    })
}

async fn set_gift_card(
    State(state): State<Shared>,
    Path(cart_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    with_cart(&state, &cart_id, |cart| {
        cart["gift_card_details"] = body;
    })
}

async fn remove_gift_card(State(state): State<Shared>, Path(cart_id): Path<String>) -> Response {
    with_cart(&state, &cart_id, |cart| {
        cart["gift_card_details"] = Value::Null;
    })
}

async fn redemption_methods() -> Json<Value> {
    Json(json!({
        "options": [
            {"id": "method-small", "points_to_redeem": 100, "is_active": true, "reward": {"discount_value": "5"}},
            {"id": "method-large", "points_to_redeem": 1000, "is_active": true, "reward": {"discount_value": 60.5}},
            {"id": "method-retired", "points_to_redeem": 10, "is_active": false, "reward": {"discount_value": 1}},
        ]
    }))
}

async fn loyalty_points(headers: HeaderMap) -> Response {
    let token = headers
        .get("x-customer-token")
        .and_then(|v| v.to_str().ok());
    if token == Some(CUSTOMER_TOKEN) {
        Json(json!({"balance": 150})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": {"name": "unauthenticated"}})),
        )
            .into_response()
    }
}

/// One point per whole riyal spent.
async fn calculate_points(Query(query): Query<HashMap<String, String>>) -> Response {
    let whole = query
        .get("total")
        .and_then(|total| total.split('.').next())
        .and_then(|whole| whole.parse::<u64>().ok());
    match whole {
        Some(points) => Json(json!({ "points": points })).into_response(),
        None => rejected("total_invalid", "Total is required"),
    }
}

// =============================================================================
// Storefront under test
// =============================================================================

/// Storefront configuration for tests.
///
/// `zid` is `None` to simulate a missing API token.
///
/// # Panics
///
/// Never in practice; the fallback URL is a literal.
#[must_use]
pub fn test_config(zid: Option<&FakeZid>) -> ThemeConfig {
    let base_url = zid.map_or_else(
        || Url::parse("http://127.0.0.1:9/v1").expect("valid URL"),
        FakeZid::base_url,
    );

    ThemeConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        currency_code: "SAR".to_string(),
        loyalty_option_label: None,
        time_ago_labels: TimeAgoLabels::default(),
        zid: ZidApiConfig {
            base_url,
            store_id: STORE_ID.to_string(),
            access_token: zid.map(|_| SecretString::from(API_TOKEN)),
            language: "en".to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A response with its body read.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Value of a header, if present and ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The `HX-Trigger` header parsed as JSON, when it is JSON.
    #[must_use]
    pub fn trigger_json(&self) -> Option<Value> {
        self.header("hx-trigger")
            .and_then(|raw| serde_json::from_str(raw).ok())
    }

    /// Whether the `HX-Trigger` header fires `event`.
    #[must_use]
    pub fn fired(&self, event: &str) -> bool {
        self.trigger_json()
            .is_some_and(|events| events.get(event).is_some())
    }

    /// The badge visibility the response asks the page to apply.
    #[must_use]
    pub fn badge_hidden(&self) -> Option<bool> {
        self.trigger_json()?
            .get("cart-badge")?
            .get("hidden")?
            .as_bool()
    }
}

/// The storefront router plus a browser-like cookie jar of one cookie.
pub struct TestApp {
    router: Router,
    cookie: Option<String>,
}

impl TestApp {
    /// Storefront talking to `zid`, or with no API token when `None`.
    #[must_use]
    pub fn new(zid: Option<&FakeZid>) -> Self {
        Self {
            router: zid_theme_storefront::app(AppState::new(test_config(zid))),
            cookie: None,
        }
    }

    /// Send a request, remembering any session cookie set.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn send(
        &mut self,
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: impl Into<Body>,
        extra_headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        for (name, value) in extra_headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(body.into()).expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            && let Some(pair) = set_cookie.split(';').next()
        {
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// `GET` with no body.
    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None, Body::empty(), &[]).await
    }

    /// `POST` an urlencoded form.
    pub async fn post_form(&mut self, uri: &str, form: &str) -> TestResponse {
        self.send(
            Method::POST,
            uri,
            Some("application/x-www-form-urlencoded"),
            form.to_string(),
            &[],
        )
        .await
    }

    /// `GET` as a logged-in customer.
    pub async fn get_as_customer(&mut self, uri: &str) -> TestResponse {
        self.send(
            Method::GET,
            uri,
            None,
            Body::empty(),
            &[("x-customer-token", CUSTOMER_TOKEN)],
        )
        .await
    }

    /// `POST` a JSON body.
    pub async fn post_json(&mut self, uri: &str, body: &Value) -> TestResponse {
        self.send(
            Method::POST,
            uri,
            Some("application/json"),
            body.to_string(),
            &[],
        )
        .await
    }

    /// Add a product, creating the session's cart on first use.
    pub async fn add_to_cart(&mut self, product_id: &str, quantity: u32) -> TestResponse {
        self.post_form(
            "/cart/add",
            &format!("product_id={product_id}&quantity={quantity}"),
        )
        .await
    }
}
