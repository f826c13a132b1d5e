//! Account route handlers.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Address, AddressForm};
use crate::state::AppState;

/// Saved addresses.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    Ok(Json(state.store().list_addresses(user.id).await?))
}

/// Save an address outside of checkout.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(form): Json<AddressForm>,
) -> Result<(StatusCode, Json<Address>)> {
    let address = form
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let address = state.store().create_address(user.id, &address).await?;

    tracing::info!(address_id = %address.id, "Address saved");
    Ok((StatusCode::CREATED, Json(address)))
}
