//! Session-related types.
//!
//! Types stored in the session for authentication and checkout state.

use serde::{Deserialize, Serialize};

use kirana_core::UserId;

/// Session-stored user identity.
///
/// Written by `POST /auth/session` once the identity provider's signed
/// hand-off checks out. The storefront never verifies credentials itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Identity provider's user ID.
    pub id: UserId,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the durable pending-order record (checkout resume state).
    pub const PENDING_ORDER: &str = "pending_order";
}
