//! Checkout route handlers.
//!
//! Each request rebuilds the wizard from the session's pending record, runs
//! one step and answers with the resulting view.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use kirana_core::AddressId;

use crate::checkout::{
    CheckoutError, CheckoutStage, CheckoutWizard, LineReview, OrderSnapshot, start_buy_now,
};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Address, AddressForm, CurrentUser, OrderItem};
use crate::pending::SessionPendingStore;
use crate::state::AppState;
use crate::store::Store;

type Wizard<'a> = CheckoutWizard<'a, dyn Store + 'a, SessionPendingStore>;

/// What the client needs to render the current stage.
#[derive(Debug, Serialize)]
pub struct CheckoutView {
    #[serde(flatten)]
    pub stage: CheckoutStage,
    pub selected_address: Option<AddressId>,
    /// Saved addresses, at address selection.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<Address>,
    /// Lines priced with current data, at line confirmation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<LineReview>,
    /// The confirmed lines, at payment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<OrderSnapshot>,
}

/// Address selection body.
#[derive(Debug, Deserialize)]
pub struct SelectAddressRequest {
    pub address_id: AddressId,
}

/// Buy-now body.
#[derive(Debug, Deserialize)]
pub struct BuyNowRequest {
    pub items: Vec<OrderItem>,
}

async fn resume<'a>(
    state: &'a AppState,
    pending: &'a SessionPendingStore,
    user: &CurrentUser,
) -> std::result::Result<Wizard<'a>, CheckoutError> {
    CheckoutWizard::resume(
        state.store(),
        pending,
        user.id,
        state.in_flight().clone(),
        state.config().currency,
    )
    .await
}

async fn view(wizard: &Wizard<'_>) -> Result<Json<CheckoutView>> {
    let stage = wizard.stage();
    let mut view = CheckoutView {
        stage,
        selected_address: wizard.selected_address(),
        addresses: Vec::new(),
        review: None,
        snapshot: wizard.snapshot().cloned(),
    };

    match stage {
        CheckoutStage::AddressSelection => view.addresses = wizard.addresses().await?,
        CheckoutStage::LineConfirmation => view.review = Some(wizard.review_lines().await?),
        CheckoutStage::Payment | CheckoutStage::Completed { .. } => {}
    }

    Ok(Json(view))
}

/// Show the current checkout stage.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<Json<CheckoutView>> {
    let pending = SessionPendingStore::new(session);
    let wizard = resume(&state, &pending, &user).await?;
    view(&wizard).await
}

/// Save a new address, select it and move on to line confirmation.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Json(form): Json<AddressForm>,
) -> Result<Json<CheckoutView>> {
    let pending = SessionPendingStore::new(session);
    let mut wizard = resume(&state, &pending, &user).await?;
    wizard.create_address(&form).await?;
    wizard.continue_to_confirmation().await?;
    view(&wizard).await
}

/// Select a saved address and move on to line confirmation.
///
/// A selection only outlives the request once it is recorded, so selecting
/// and continuing happen together.
#[instrument(skip_all, fields(user_id = %user.id, address_id = %request.address_id))]
pub async fn select_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Json(request): Json<SelectAddressRequest>,
) -> Result<Json<CheckoutView>> {
    let pending = SessionPendingStore::new(session);
    let mut wizard = resume(&state, &pending, &user).await?;
    wizard.select_address(request.address_id).await?;
    wizard.continue_to_confirmation().await?;
    view(&wizard).await
}

/// Freeze the reviewed lines.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn confirm(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<Json<CheckoutView>> {
    let pending = SessionPendingStore::new(session);
    let mut wizard = resume(&state, &pending, &user).await?;
    wizard.confirm_lines().await?;
    view(&wizard).await
}

/// Step back one stage.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn back(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<Json<CheckoutView>> {
    let pending = SessionPendingStore::new(session);
    let mut wizard = resume(&state, &pending, &user).await?;
    wizard.back().await?;
    view(&wizard).await
}

/// Place the order and redirect to it.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn pay(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<Response> {
    let pending = SessionPendingStore::new(session);
    let mut wizard = resume(&state, &pending, &user).await?;
    let order_id = wizard.place_order().await?;

    tracing::info!(%order_id, "Order placed");
    Ok(Redirect::to(&format!("/orders/{order_id}")).into_response())
}

/// Start a checkout for specific lines, leaving the cart alone.
#[instrument(skip_all, fields(user_id = %user.id, line_count = request.items.len()))]
pub async fn buy_now(
    RequireAuth(user): RequireAuth,
    session: Session,
    Json(request): Json<BuyNowRequest>,
) -> Result<Response> {
    let pending = SessionPendingStore::new(session);
    start_buy_now(&pending, user.id, request.items).await?;
    Ok(Redirect::to("/checkout").into_response())
}
