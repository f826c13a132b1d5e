//! The checkout wizard driven over HTTP against the in-memory store.
//!
//! Every request resumes the wizard from the session, so these tests also
//! cover that stage, address and confirmed lines survive between requests.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;

use kirana_storefront::store::memory::FailPoint;
use kirana_integration_tests::{TestApp, address_body, decimal};

/// Sign in, fill the cart with A x2 @ 100 and B x1 @ 50.
async fn app_with_cart() -> TestApp {
    let app = TestApp::new();
    let a = app.product("Atta", 100);
    let b = app.product("Besan", 50);
    app.sign_in().await;

    for product_id in [a, a, b] {
        let response = app
            .post_json("/cart/add", &json!({ "product_id": product_id }))
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }
    app
}

/// Walk from address selection to payment with a new address.
async fn reach_payment(app: &TestApp) {
    let response = app.post_json("/checkout/address", &address_body("Home")).await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["stage"], "line_confirmation");

    let response = app.post("/checkout/confirm").await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["stage"], "payment");
}

#[tokio::test]
async fn test_cart_checkout_places_order_with_confirmed_total() {
    let app = app_with_cart().await;

    let response = app.get("/checkout").await;
    assert_eq!(response.body["stage"], "address_selection");

    let response = app.post_json("/checkout/address", &address_body("Home")).await;
    assert_eq!(response.body["stage"], "line_confirmation");
    assert_eq!(decimal(&response.body["review"]["total"]), Decimal::from(250));
    assert_eq!(response.body["review"]["lines"].as_array().unwrap().len(), 2);

    let response = app.post("/checkout/confirm").await;
    assert_eq!(response.body["stage"], "payment");
    assert_eq!(decimal(&response.body["snapshot"]["total"]), Decimal::from(250));

    let response = app.post("/checkout/pay").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    let location = response.location.unwrap();
    assert!(location.starts_with("/orders/"));

    let order = app.get(&location).await;
    assert_eq!(order.status, StatusCode::OK);
    assert_eq!(decimal(&order.body["total_amount"]), Decimal::from(250));
    assert_eq!(order.body["status"], "pending");
    assert_eq!(order.body["lines"].as_array().unwrap().len(), 2);

    // Success clears the pending checkout.
    let response = app.get("/checkout").await;
    assert_eq!(response.body["stage"], "address_selection");
}

#[tokio::test]
async fn test_reload_resumes_at_payment() {
    let app = app_with_cart().await;
    reach_payment(&app).await;

    let response = app.get("/checkout").await;
    assert_eq!(response.body["stage"], "payment");
    assert_eq!(decimal(&response.body["snapshot"]["total"]), Decimal::from(250));
}

#[tokio::test]
async fn test_buy_now_bypasses_cart() {
    let app = app_with_cart().await;
    let c = app.product("Chana", 40);

    let response = app
        .post_json(
            "/buy-now",
            &json!({ "items": [{ "product_id": c, "quantity": 3 }] }),
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/checkout"));

    let response = app.post_json("/checkout/address", &address_body("Home")).await;
    let lines = response.body["review"]["lines"].as_array().unwrap().clone();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["product_id"], json!(c));
    assert_eq!(lines[0]["quantity"], 3);
    assert_eq!(decimal(&response.body["review"]["total"]), Decimal::from(120));

    app.post("/checkout/confirm").await;
    let response = app.post("/checkout/pay").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let order = app.get(&response.location.unwrap()).await;
    assert_eq!(decimal(&order.body["total_amount"]), Decimal::from(120));

    // The cart is untouched.
    let cart = app.get("/cart").await;
    assert_eq!(cart.body["totals"]["item_count"], 3);
}

#[tokio::test]
async fn test_buy_now_rejects_zero_quantity() {
    let app = TestApp::new();
    let c = app.product("Chana", 40);
    app.sign_in().await;

    let response = app
        .post_json(
            "/buy-now",
            &json!({ "items": [{ "product_id": c, "quantity": 0 }] }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "validation");
}

#[tokio::test]
async fn test_product_removed_before_payment() {
    let app = TestApp::new();
    let c = app.product("Chana", 40);
    app.sign_in().await;
    app.post_json(
        "/buy-now",
        &json!({ "items": [{ "product_id": c, "quantity": 3 }] }),
    )
    .await;
    reach_payment(&app).await;

    app.store().remove_product(c);

    let response = app.post("/checkout/pay").await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "product_unavailable");
    assert_eq!(response.body["missing"], json!([c]));
    assert!(app.store().orders().is_empty());

    // Still at payment with the same confirmed lines.
    let response = app.get("/checkout").await;
    assert_eq!(response.body["stage"], "payment");
    assert_eq!(decimal(&response.body["snapshot"]["total"]), Decimal::from(120));
}

#[tokio::test]
async fn test_price_change_blocks_payment() {
    let app = TestApp::new();
    let a = app.product("Atta", 100);
    app.sign_in().await;
    app.post_json("/cart/add", &json!({ "product_id": a })).await;
    reach_payment(&app).await;

    app.store().set_price(a, Decimal::from(120));

    let response = app.post("/checkout/pay").await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "price_changed");
    assert_eq!(decimal(&response.body["confirmed_total"]), Decimal::from(100));
    assert_eq!(decimal(&response.body["current_total"]), Decimal::from(120));
    assert!(app.store().orders().is_empty());

    // Going back re-prices the lines.
    let response = app.post("/checkout/back").await;
    assert_eq!(response.body["stage"], "line_confirmation");
    assert_eq!(decimal(&response.body["review"]["total"]), Decimal::from(120));
}

#[tokio::test]
async fn test_failed_line_write_can_be_retried() {
    let app = app_with_cart().await;
    reach_payment(&app).await;

    app.store().fail(FailPoint::CreateOrderLines);
    let response = app.post("/checkout/pay").await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(app.store().orders().is_empty());
    assert_eq!(app.get("/checkout").await.body["stage"], "payment");

    app.store().heal(FailPoint::CreateOrderLines);
    let response = app.post("/checkout/pay").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(app.store().orders().len(), 1);
    assert_eq!(app.store().order_lines().len(), 2);
}

#[tokio::test]
async fn test_back_steps_one_stage_at_a_time() {
    let app = app_with_cart().await;
    reach_payment(&app).await;

    let response = app.post("/checkout/back").await;
    assert_eq!(response.body["stage"], "line_confirmation");
    assert!(response.body.get("snapshot").is_none());

    let response = app.post("/checkout/back").await;
    assert_eq!(response.body["stage"], "address_selection");
    assert_eq!(response.body["addresses"].as_array().unwrap().len(), 1);

    let response = app.post("/checkout/back").await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "wrong_stage");

    // Backing out of line confirmation is durable too.
    assert_eq!(app.get("/checkout").await.body["stage"], "address_selection");
}

#[tokio::test]
async fn test_select_saved_address() {
    let app = app_with_cart().await;
    let saved = app
        .post_json("/account/addresses", &address_body("Office"))
        .await;
    assert_eq!(saved.status, StatusCode::CREATED);

    let response = app
        .post_json(
            "/checkout/address/select",
            &json!({ "address_id": saved.body["id"] }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["stage"], "line_confirmation");
    assert_eq!(response.body["selected_address"], saved.body["id"]);
}

#[tokio::test]
async fn test_cannot_select_another_identitys_address() {
    let app = app_with_cart().await;
    let other = app.other_browser();
    other.sign_in().await;
    let theirs = other
        .post_json("/account/addresses", &address_body("Theirs"))
        .await;

    let response = app
        .post_json(
            "/checkout/address/select",
            &json!({ "address_id": theirs.body["id"] }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.get("/checkout").await.body["stage"], "address_selection");
}

#[tokio::test]
async fn test_incomplete_address_is_rejected() {
    let app = app_with_cart().await;

    let mut body = address_body("Home");
    body["pincode"] = json!("  ");
    let response = app.post_json("/checkout/address", &body).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "validation");
    assert_eq!(app.get("/checkout").await.body["stage"], "address_selection");
}

#[tokio::test]
async fn test_empty_cart_cannot_be_confirmed() {
    let app = TestApp::new();
    app.sign_in().await;
    app.post_json("/checkout/address", &address_body("Home")).await;

    let response = app.post("/checkout/confirm").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.get("/checkout").await.body["stage"], "line_confirmation");
}

#[tokio::test]
async fn test_pay_out_of_order_is_refused() {
    let app = app_with_cart().await;

    let response = app.post("/checkout/pay").await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "wrong_stage");
    assert!(app.store().orders().is_empty());
}

#[tokio::test]
async fn test_checkout_requires_sign_in() {
    let app = TestApp::new();

    let response = app.post("/checkout/pay").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/auth/login"));
}

#[tokio::test]
async fn test_logout_drops_pending_checkout() {
    let app = app_with_cart().await;
    reach_payment(&app).await;

    assert_eq!(app.post("/auth/logout").await.status, StatusCode::NO_CONTENT);
    app.sign_in().await;
    assert_eq!(app.get("/checkout").await.body["stage"], "address_selection");
}

#[tokio::test]
async fn test_next_identity_on_same_browser_starts_fresh() {
    let app = app_with_cart().await;
    reach_payment(&app).await;

    // Bob signs in on the browser Alice left at payment.
    app.sign_in().await;

    let response = app.get("/checkout").await;
    assert_eq!(response.body["stage"], "address_selection");
    assert!(response.body["selected_address"].is_null());
    assert!(response.body["snapshot"].is_null());
    assert!(response.body.get("addresses").is_none());

    let response = app.post("/checkout/pay").await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert!(app.store().orders().is_empty());
}

#[tokio::test]
async fn test_same_identity_signing_in_again_keeps_checkout() {
    let app = TestApp::new();
    let a = app.product("Atta", 100);
    let alice = app.sign_in().await;
    app.post_json("/cart/add", &json!({ "product_id": a })).await;
    reach_payment(&app).await;

    app.sign_in_as(alice).await;
    assert_eq!(app.get("/checkout").await.body["stage"], "payment");
}
