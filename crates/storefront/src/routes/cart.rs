//! Cart route handlers.
//!
//! Every mutation answers with the updated cart so the client can re-render
//! without a second request.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use kirana_core::{CartLineId, ProductId};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{CartLine, CartTotals, CurrentUser};
use crate::services::CartService;
use crate::state::AppState;

/// Cart response.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
}

/// Add to cart body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
}

/// Update quantity body.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub line_id: CartLineId,
    pub quantity: i64,
}

/// Remove line body.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub line_id: CartLineId,
}

async fn view(state: &AppState, user: CurrentUser) -> Result<Json<CartView>> {
    let (lines, totals) = CartService::new(state.store()).view(user.id).await?;
    Ok(Json(CartView { lines, totals }))
}

/// Display the cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    view(&state, user).await
}

/// Add one of a product.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %request.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    CartService::new(state.store())
        .add(user.id, request.product_id)
        .await?;
    view(&state, user).await
}

/// Set a line's quantity.
#[instrument(skip_all, fields(user_id = %user.id, line_id = %request.line_id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    CartService::new(state.store())
        .update_quantity(user.id, request.line_id, request.quantity)
        .await?;
    view(&state, user).await
}

/// Remove a line.
#[instrument(skip_all, fields(user_id = %user.id, line_id = %request.line_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    CartService::new(state.store())
        .remove(user.id, request.line_id)
        .await?;
    view(&state, user).await
}

/// Empty the cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    CartService::new(state.store()).clear(user.id).await?;
    view(&state, user).await
}
