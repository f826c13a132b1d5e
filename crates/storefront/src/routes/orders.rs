//! Order history route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use kirana_core::OrderId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::{OrderDetail, OrderService, OrderSummary};
use crate::state::AppState;

/// The identity's orders, newest first.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderSummary>>> {
    Ok(Json(OrderService::new(state.store()).history(user.id).await?))
}

/// One order with its lines. Other identities' orders are not found.
#[instrument(skip_all, fields(user_id = %user.id, order_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    Ok(Json(
        OrderService::new(state.store()).detail(user.id, id).await?,
    ))
}
