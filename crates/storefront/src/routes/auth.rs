//! Authentication route handlers.
//!
//! Credentials are verified by the external identity provider. Once it has
//! authenticated a user, its callback posts a signed hand-off to
//! `POST /auth/session`. Only a hand-off signed with the shared secret
//! becomes a signed-in session; anything else gets 401.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::identity::SignedIdentity;
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Where unauthenticated requests are redirected.
pub async fn login_page() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": "Sign in to continue.",
        })),
    )
        .into_response()
}

/// Verify a signed hand-off and record the identity in the session.
#[instrument(skip_all, fields(user_id = %hand_off.user_id))]
pub async fn create_session(
    State(state): State<AppState>,
    session: Session,
    Json(hand_off): Json<SignedIdentity>,
) -> Result<StatusCode> {
    let id = hand_off
        .verify(&state.config().auth_secret, Utc::now())
        .map_err(|e| {
            tracing::warn!(error = %e, "Rejected sign-in hand-off");
            AppError::Unauthorized(e.to_string())
        })?;

    let user = CurrentUser { id };
    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id);

    tracing::info!("Signed in");
    Ok(StatusCode::NO_CONTENT)
}

/// Sign out, dropping the session and any checkout progress with it.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}
