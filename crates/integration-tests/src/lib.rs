//! Integration tests for Kirana.
//!
//! # Running Tests
//!
//! ```bash
//! # Router-level tests against the in-memory store
//! cargo test -p kirana-integration-tests
//!
//! # PostgreSQL store tests (need a migrated database)
//! STOREFRONT_DATABASE_URL=postgres://... cargo test -p kirana-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `checkout_flow` - The checkout wizard driven over HTTP
//! - `storefront_api` - Cart, catalogue, reviews, orders, account
//! - `postgres_store` - `PgStore` against a real database

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Utc;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use kirana_core::{ProductId, UserId};
use kirana_storefront::config::StorefrontConfig;
use kirana_storefront::identity::SignedIdentity;
use kirana_storefront::middleware::session_layer;
use kirana_storefront::models::NewProduct;
use kirana_storefront::state::AppState;
use kirana_storefront::store::memory::MemoryStore;

/// Secret shared with the (simulated) identity provider.
pub const AUTH_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// A response reduced to what tests look at.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Value,
}

/// The storefront router over an in-memory store, with one browser's cookie.
pub struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    cookie: Mutex<Option<String>>,
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let config = StorefrontConfig::from_vars(|key| match key {
            "STOREFRONT_DATABASE_URL" => Some("postgres://localhost/kirana_test".to_string()),
            "STOREFRONT_BASE_URL" => Some("http://localhost:3000".to_string()),
            "STOREFRONT_AUTH_SECRET" => Some(AUTH_SECRET.to_string()),
            _ => None,
        })
        .expect("test configuration");

        let store = Arc::new(MemoryStore::new());
        let router = kirana_storefront::app(
            AppState::new(config, store.clone()),
            session_layer(tower_sessions::MemoryStore::default(), false),
        );

        Self {
            router,
            store,
            cookie: Mutex::new(None),
        }
    }

    /// Another browser on the same server and store, with no cookie.
    #[must_use]
    pub fn other_browser(&self) -> Self {
        Self {
            router: self.router.clone(),
            store: self.store.clone(),
            cookie: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Add a product priced `price` (in rupees) to the catalogue.
    pub fn product(&self, title: &str, price: i64) -> ProductId {
        self.store
            .insert_product(&NewProduct {
                title: title.to_string(),
                description: Some(format!("{title}, fresh stock")),
                price: Decimal::from(price),
                mrp: Decimal::from(price + 10),
                thumbnail_url: Some(format!("/images/{}.jpg", title.to_lowercase())),
                image_urls: Vec::new(),
            })
            .id
    }

    /// Sign a fresh identity in and return it.
    pub async fn sign_in(&self) -> UserId {
        let user_id = UserId::new();
        self.sign_in_as(user_id).await;
        user_id
    }

    /// Sign `user_id` in on this browser with a valid hand-off.
    pub async fn sign_in_as(&self, user_id: UserId) {
        let hand_off =
            SignedIdentity::new(&SecretString::from(AUTH_SECRET), user_id, Utc::now());
        let body = serde_json::to_value(&hand_off).expect("hand-off serializes");
        let response = self.post_json("/auth/session", &body).await;
        assert_eq!(response.status, StatusCode::NO_CONTENT);
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::builder().method("GET").uri(uri), Body::empty())
            .await
    }

    pub async fn post(&self, uri: &str) -> TestResponse {
        self.send(Request::builder().method("POST").uri(uri), Body::empty())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> TestResponse {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json"),
            Body::from(body.to_string()),
        )
        .await
    }

    async fn send(&self, mut builder: axum::http::request::Builder, body: Body) -> TestResponse {
        if let Some(cookie) = self.cookie.lock().expect("cookie lock").clone() {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = builder.body(body).expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible router");

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
        {
            *self.cookie.lock().expect("cookie lock") = Some(set_cookie.to_string());
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            location,
            body,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a decimal that was serialized as a JSON string.
#[must_use]
pub fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("expected a decimal string, got {value}"))
}

/// A valid checkout address body.
#[must_use]
pub fn address_body(label: &str) -> Value {
    serde_json::json!({
        "label": label,
        "name": "Asha Rao",
        "address_line": "12 MG Road",
        "city": "Bengaluru",
        "pincode": "560001",
        "phone": "9800000000",
    })
}
