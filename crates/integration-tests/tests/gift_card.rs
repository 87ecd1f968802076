//! Integration tests for the cart's gift card.

use axum::http::StatusCode;
use serde_json::json;
use zid_theme_integration_tests::{FakeZid, TestApp};

#[tokio::test]
async fn test_save_and_remove_gift_card() {
    let zid = FakeZid::start().await;
    let mut app = TestApp::new(Some(&zid));
    app.add_to_cart("p-1", 1).await;

    let response = app
        .post_form(
            "/cart/gift",
            "sender_name=+Sara+&receiver_name=Omar&gift_message=Happy+Eid",
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.fired("cart-updated"));
    assert!(response.body.contains(r#"hx-swap-oob="innerHTML:[data-gift-card]""#));
    assert!(response.body.contains("<span data-gift-sender>Sara</span>"));
    assert!(response.body.contains("Happy Eid"));
    assert!(response.body.contains(">25.00 SAR (1)<"));
    assert_eq!(
        zid.cart("cart-1").expect("cart")["gift_card_details"],
        json!({"sender_name": "Sara", "receiver_name": "Omar", "gift_message": "Happy Eid"})
    );

    // The form reopens prefilled
    let response = app.get("/cart/gift").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains(r#"name="receiver_name" value="Omar""#));
    assert!(response.body.contains("gift-delete"));

    let response = app.post_form("/cart/gift/remove", "").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.fired("cart-updated"));
    assert!(!response.body.contains("Sara"));
    assert_eq!(
        zid.cart("cart-1").expect("cart")["gift_card_details"],
        json!(null)
    );
}

#[tokio::test]
async fn test_gift_card_needs_both_names() {
    let zid = FakeZid::start().await;
    let mut app = TestApp::new(Some(&zid));
    app.add_to_cart("p-1", 1).await;
    let before = zid.requests().len();

    let response = app
        .post_form("/cart/gift", "sender_name=Sara&receiver_name=++")
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.trigger_json(),
        Some(json!({"cart:error": {"message": "Enter the receiver's name"}}))
    );
    assert_eq!(zid.requests().len(), before);
}

#[tokio::test]
async fn test_gift_form_without_cart_is_empty() {
    let zid = FakeZid::start().await;
    let mut app = TestApp::new(Some(&zid));

    let response = app.get("/cart/gift").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains(r#"name="sender_name" value="""#));
    assert!(!response.body.contains("gift-delete"));

    let response = app
        .post_form("/cart/gift", "sender_name=Sara&receiver_name=Omar")
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_gift_form_after_cart_expired_is_empty() {
    let zid = FakeZid::start().await;
    let mut app = TestApp::new(Some(&zid));
    app.add_to_cart("p-1", 1).await;
    app.post_form("/cart/gift", "sender_name=Sara&receiver_name=Omar")
        .await;
    zid.expire_carts();

    let response = app.get("/cart/gift").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(!response.body.contains("Sara"));
}
