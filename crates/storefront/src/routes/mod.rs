//! HTTP route handlers for storefront.
//!
//! Every body in and out is JSON; presentation lives in the client.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                   - Liveness
//! GET  /health/ready             - Readiness (store reachable)
//!
//! # Auth
//! GET  /auth/login               - Where unauthenticated browsers are sent
//! POST /auth/session             - Hand-off from the identity provider
//! POST /auth/logout              - Sign out
//!
//! # Products
//! GET  /products                  - Catalogue, ordered by title
//! GET  /products/search?q=       - Search (at most 5 results)
//! GET  /products/{id}            - Product with rating summary
//! GET  /products/{id}/reviews    - Reviews with summary
//! POST /products/{id}/reviews    - Submit a review (auth)
//!
//! # Cart (auth)
//! GET  /cart                     - Lines and totals
//! POST /cart/add                 - Add one of a product
//! POST /cart/update              - Set a line's quantity (<= 0 removes)
//! POST /cart/remove              - Remove a line
//! POST /cart/clear               - Empty the cart
//!
//! # Checkout (auth)
//! POST /buy-now                  - Check out specific lines, 303 to /checkout
//! GET  /checkout                 - Current stage and what it needs
//! POST /checkout/address         - Create an address and continue
//! POST /checkout/address/select  - Select a saved address and continue
//! POST /checkout/confirm         - Freeze the lines
//! POST /checkout/back            - Step back one stage
//! POST /checkout/pay             - Place the order, 303 to /orders/{id}
//!
//! # Orders and account (auth)
//! GET  /orders                   - Order history
//! GET  /orders/{id}              - Order detail
//! GET  /account/addresses        - Saved addresses
//! POST /account/addresses        - Save an address
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page))
        .route("/session", post(auth::create_session))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list))
        .route("/search", get(products::search))
        .route("/{id}", get(products::show))
        .route(
            "/{id}/reviews",
            get(products::reviews).post(products::create_review),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/address", post(checkout::create_address))
        .route("/address/select", post(checkout::select_address))
        .route("/confirm", post(checkout::confirm))
        .route("/back", post(checkout::back))
        .route("/pay", post(checkout::pay))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new().route(
        "/addresses",
        get(account::addresses).post(account::create_address),
    )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/buy-now", post(checkout::buy_now))
        .nest("/checkout", checkout_routes())
        .nest("/orders", order_routes())
        .nest("/account", account_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
