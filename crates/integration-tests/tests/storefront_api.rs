//! Catalogue, cart, reviews, orders and account endpoints.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;

use kirana_integration_tests::{TestApp, address_body, decimal};

#[tokio::test]
async fn test_cart_add_update_remove_clear() {
    let app = TestApp::new();
    let a = app.product("Atta", 100);
    let b = app.product("Besan", 50);
    app.sign_in().await;

    app.post_json("/cart/add", &json!({ "product_id": a })).await;
    let cart = app.post_json("/cart/add", &json!({ "product_id": a })).await;
    assert_eq!(cart.body["lines"].as_array().unwrap().len(), 1);
    assert_eq!(cart.body["lines"][0]["quantity"], 2);

    let cart = app.post_json("/cart/add", &json!({ "product_id": b })).await;
    assert_eq!(cart.body["totals"]["item_count"], 3);
    assert_eq!(decimal(&cart.body["totals"]["subtotal"]), Decimal::from(250));

    let line_b = cart.body["lines"]
        .as_array()
        .unwrap()
        .iter()
        .find(|line| line["product"]["id"] == json!(b))
        .unwrap()["id"]
        .clone();

    let cart = app
        .post_json("/cart/update", &json!({ "line_id": line_b, "quantity": 4 }))
        .await;
    assert_eq!(decimal(&cart.body["totals"]["subtotal"]), Decimal::from(400));

    let cart = app
        .post_json("/cart/update", &json!({ "line_id": line_b, "quantity": 0 }))
        .await;
    assert_eq!(cart.body["lines"].as_array().unwrap().len(), 1);

    let line_a = cart.body["lines"][0]["id"].clone();
    let cart = app.post_json("/cart/remove", &json!({ "line_id": line_a })).await;
    assert!(cart.body["lines"].as_array().unwrap().is_empty());

    app.post_json("/cart/add", &json!({ "product_id": a })).await;
    let cart = app.post("/cart/clear").await;
    assert_eq!(cart.body["totals"]["item_count"], 0);
}

#[tokio::test]
async fn test_cart_rejects_unknown_product() {
    let app = TestApp::new();
    app.sign_in().await;

    let response = app
        .post_json("/cart/add", &json!({ "product_id": uuid::Uuid::new_v4() }))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_carts_are_per_identity() {
    let app = TestApp::new();
    let a = app.product("Atta", 100);
    app.sign_in().await;
    app.post_json("/cart/add", &json!({ "product_id": a })).await;

    let other = app.other_browser();
    other.sign_in().await;
    let cart = other.get("/cart").await;
    assert!(cart.body["lines"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unsigned_sign_in_is_unauthorized() {
    let app = TestApp::new();
    let victim = uuid::Uuid::new_v4();

    let response = app
        .post_json("/auth/session", &json!({ "user_id": victim }))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "unauthorized");

    let response = app
        .post_json(
            "/auth/session",
            &json!({ "user_id": victim, "issued_at": 0, "signature": "00".repeat(32) }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    // No session was created.
    assert_eq!(app.get("/cart").await.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_catalogue_lists_every_product_by_title() {
    let app = TestApp::new();
    for title in ["Toor Dal", "Atta", "Masala 1", "Besan", "Jaggery", "Ghee", "Rice"] {
        app.product(title, 40);
    }

    let response = app.get("/products").await;
    assert_eq!(response.status, StatusCode::OK);
    let titles: Vec<&str> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(
        titles,
        ["Atta", "Besan", "Ghee", "Jaggery", "Masala 1", "Rice", "Toor Dal"]
    );
}

#[tokio::test]
async fn test_search_is_limited_and_trimmed() {
    let app = TestApp::new();
    for i in 0..7 {
        app.product(&format!("Masala {i}"), 20);
    }
    app.product("Jaggery", 60);

    let response = app.get("/products/search?q=%20masala%20").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_array().unwrap().len(), 5);

    let response = app.get("/products/search?q=").await;
    assert!(response.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_product_page_and_reviews() {
    let app = TestApp::new();
    let a = app.product("Atta", 100);

    let page = app.get(&format!("/products/{a}")).await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["title"], "Atta");
    assert_eq!(page.body["rating"]["count"], 0);

    // Reviewing needs a signed-in identity.
    let response = app
        .post_json(&format!("/products/{a}/reviews"), &json!({ "rating": 5 }))
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    app.sign_in().await;
    for rating in [5, 4] {
        let response = app
            .post_json(
                &format!("/products/{a}/reviews"),
                &json!({ "rating": rating, "comment": "Fresh and fine." }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
    }

    let response = app
        .post_json(&format!("/products/{a}/reviews"), &json!({ "rating": 6 }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let reviews = app.get(&format!("/products/{a}/reviews")).await;
    assert_eq!(reviews.body["reviews"].as_array().unwrap().len(), 2);
    assert_eq!(reviews.body["summary"]["count"], 2);
    assert_eq!(decimal(&reviews.body["summary"]["average"]), Decimal::new(45, 1));
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let app = TestApp::new();
    let response = app
        .get(&format!("/products/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_orders_are_scoped_to_identity() {
    let app = TestApp::new();
    let a = app.product("Atta", 100);
    app.sign_in().await;
    app.post_json("/cart/add", &json!({ "product_id": a })).await;
    app.post_json("/checkout/address", &address_body("Home")).await;
    app.post("/checkout/confirm").await;
    let location = app.post("/checkout/pay").await.location.unwrap();

    let history = app.get("/orders").await;
    assert_eq!(history.body.as_array().unwrap().len(), 1);
    assert_eq!(history.body[0]["lines"].as_array().unwrap().len(), 1);

    let other = app.other_browser();
    other.sign_in().await;
    assert_eq!(other.get(&location).await.status, StatusCode::NOT_FOUND);
    assert!(other.get("/orders").await.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_account_addresses() {
    let app = TestApp::new();
    app.sign_in().await;

    let response = app.post_json("/account/addresses", &address_body("Home")).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["city"], "Bengaluru");

    let response = app
        .post_json("/account/addresses", &json!({ "label": "Empty" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let list = app.get("/account/addresses").await;
    assert_eq!(list.body.as_array().unwrap().len(), 1);
}
