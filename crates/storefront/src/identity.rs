//! Signed identity hand-off from the identity provider.
//!
//! After the provider authenticates someone it posts `user_id`, `issued_at`
//! (unix seconds) and `signature` to `POST /auth/session`, where
//! `signature = hex(HMAC-SHA256(STOREFRONT_AUTH_SECRET, "{user_id}.{issued_at}"))`.
//! Only hand-offs with a valid signature that are at most
//! [`MAX_HAND_OFF_AGE_SECS`] old become a signed-in session.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use kirana_core::UserId;

type HmacSha256 = Hmac<Sha256>;

/// Oldest hand-off accepted, in seconds.
pub const MAX_HAND_OFF_AGE_SECS: i64 = 300;

/// Tolerated clock skew for hand-offs issued "in the future", in seconds.
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Why a hand-off was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("signature is not valid hex")]
    MalformedSignature,

    #[error("signature does not match")]
    BadSignature,

    #[error("hand-off issued at {issued_at} is outside the accepted window")]
    Expired { issued_at: i64 },
}

/// Identity as posted by the provider.
///
/// A body without `issued_at` or `signature` parses as an unsigned hand-off
/// and fails verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedIdentity {
    pub user_id: UserId,
    #[serde(default)]
    pub issued_at: i64,
    #[serde(default)]
    pub signature: String,
}

fn mac(secret: &SecretString, user_id: UserId, issued_at: i64) -> HmacSha256 {
    // HMAC accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC takes keys of any length"));
    mac.update(format!("{user_id}.{issued_at}").as_bytes());
    mac
}

/// Sign a hand-off the way the identity provider does.
#[must_use]
pub fn sign(secret: &SecretString, user_id: UserId, issued_at: i64) -> String {
    hex::encode(mac(secret, user_id, issued_at).finalize().into_bytes())
}

impl SignedIdentity {
    /// Build a signed hand-off issued at `issued_at`.
    #[must_use]
    pub fn new(secret: &SecretString, user_id: UserId, issued_at: DateTime<Utc>) -> Self {
        let issued_at = issued_at.timestamp();
        Self {
            user_id,
            issued_at,
            signature: sign(secret, user_id, issued_at),
        }
    }

    /// Check the signature and age, returning the authenticated identity.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] if the signature is malformed or wrong, or
    /// the hand-off is too old or too far in the future.
    pub fn verify(
        &self,
        secret: &SecretString,
        now: DateTime<Utc>,
    ) -> Result<UserId, IdentityError> {
        let provided =
            hex::decode(&self.signature).map_err(|_| IdentityError::MalformedSignature)?;

        // Constant-time comparison
        mac(secret, self.user_id, self.issued_at)
            .verify_slice(&provided)
            .map_err(|_| IdentityError::BadSignature)?;

        let age = now.timestamp() - self.issued_at;
        if !(-MAX_CLOCK_SKEW_SECS..=MAX_HAND_OFF_AGE_SECS).contains(&age) {
            return Err(IdentityError::Expired {
                issued_at: self.issued_at,
            });
        }

        Ok(self.user_id)
    }
}
