//! Durable pending-order state.
//!
//! The items chosen for checkout, the selected address and the confirmed
//! line snapshot are held together in one [`PendingOrder`] record and always
//! written as a whole. A reload or a new request resumes checkout from it.
//!
//! Each record names the identity it belongs to. A record owned by anyone
//! else (for example after another person signs in on the same browser) is
//! treated as absent and replaced on the next write.

use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_sessions::Session;

use kirana_core::{AddressId, UserId};

use crate::checkout::OrderSnapshot;
use crate::models::{OrderItem, session_keys};

/// Errors reading or writing the pending record.
#[derive(Debug, Error)]
pub enum PendingStateError {
    /// The session backend failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The backing storage is unavailable.
    #[error("pending order storage unavailable: {0}")]
    Unavailable(String),
}

/// Checkout state that survives reloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOrder {
    /// Identity that started this checkout.
    #[serde(default)]
    pub owner: Option<UserId>,
    /// Lines chosen through "buy now". Empty means checkout uses the cart.
    #[serde(default)]
    pub items: Vec<OrderItem>,
    /// Address selected for delivery.
    #[serde(default)]
    pub address_id: Option<AddressId>,
    /// Lines the user confirmed, with the prices they saw.
    #[serde(default)]
    pub snapshot: Option<OrderSnapshot>,
    pub updated_at: DateTime<Utc>,
}

impl Default for PendingOrder {
    fn default() -> Self {
        Self {
            owner: None,
            items: Vec::new(),
            address_id: None,
            snapshot: None,
            updated_at: Utc::now(),
        }
    }
}

/// Storage for the pending record of one identity.
#[async_trait]
pub trait PendingOrderStore: Send + Sync {
    /// Read the record, if one exists.
    async fn load(&self) -> Result<Option<PendingOrder>, PendingStateError>;

    /// Replace the record.
    async fn save(&self, record: &PendingOrder) -> Result<(), PendingStateError>;

    /// Remove the record.
    async fn clear(&self) -> Result<(), PendingStateError>;
}

/// Load `owner`'s record. A record belonging to another identity reads as
/// `None`.
///
/// # Errors
///
/// Returns `PendingStateError` if loading fails.
pub async fn load_owned<P>(
    pending: &P,
    owner: UserId,
) -> Result<Option<PendingOrder>, PendingStateError>
where
    P: PendingOrderStore + ?Sized,
{
    let record = pending.load().await?;
    Ok(record.filter(|r| {
        let owned = r.owner == Some(owner);
        if !owned {
            tracing::info!(user_id = %owner, "Ignoring pending order of another identity");
        }
        owned
    }))
}

/// Load `owner`'s record (or start a fresh one), apply `change`, and save
/// it back stamped with `owner`.
///
/// # Errors
///
/// Returns `PendingStateError` if loading or saving fails.
pub async fn update_pending<P, F>(
    pending: &P,
    owner: UserId,
    change: F,
) -> Result<PendingOrder, PendingStateError>
where
    P: PendingOrderStore + ?Sized,
    F: FnOnce(&mut PendingOrder) + Send,
{
    let mut record = load_owned(pending, owner).await?.unwrap_or_default();
    record.owner = Some(owner);
    change(&mut record);
    record.updated_at = Utc::now();
    pending.save(&record).await?;
    Ok(record)
}

/// Pending record held in the server session under one key.
#[derive(Debug, Clone)]
pub struct SessionPendingStore {
    session: Session,
}

impl SessionPendingStore {
    /// Wrap the request's session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl PendingOrderStore for SessionPendingStore {
    async fn load(&self) -> Result<Option<PendingOrder>, PendingStateError> {
        Ok(self.session.get(session_keys::PENDING_ORDER).await?)
    }

    async fn save(&self, record: &PendingOrder) -> Result<(), PendingStateError> {
        self.session
            .insert(session_keys::PENDING_ORDER, record)
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), PendingStateError> {
        self.session
            .remove::<PendingOrder>(session_keys::PENDING_ORDER)
            .await?;
        Ok(())
    }
}

/// Pending record held in memory, with a save counter and failure switch.
#[derive(Debug, Default)]
pub struct MemoryPendingStore {
    record: Mutex<Option<PendingOrder>>,
    saves: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryPendingStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current record.
    #[must_use]
    pub fn snapshot(&self) -> Option<PendingOrder> {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of successful saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make every operation fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), PendingStateError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PendingStateError::Unavailable(
                "memory store switched off".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl PendingOrderStore for MemoryPendingStore {
    async fn load(&self) -> Result<Option<PendingOrder>, PendingStateError> {
        self.check()?;
        Ok(self.snapshot())
    }

    async fn save(&self, record: &PendingOrder) -> Result<(), PendingStateError> {
        self.check()?;
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = Some(record.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear(&self) -> Result<(), PendingStateError> {
        self.check()?;
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore as SessionMemoryStore;

    use super::*;
    use kirana_core::ProductId;

    fn item(quantity: u32) -> OrderItem {
        OrderItem {
            product_id: ProductId::new(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_update_pending_starts_fresh_record() {
        let pending = MemoryPendingStore::new();
        let user = UserId::new();
        let address = AddressId::new();

        let record = update_pending(&pending, user, |r| r.address_id = Some(address))
            .await
            .unwrap();

        assert_eq!(record.owner, Some(user));
        assert_eq!(record.address_id, Some(address));
        assert!(record.items.is_empty());
        assert_eq!(pending.snapshot(), Some(record));
        assert_eq!(pending.save_count(), 1);
    }

    #[tokio::test]
    async fn test_update_pending_keeps_other_fields() {
        let pending = MemoryPendingStore::new();
        let user = UserId::new();
        let items = vec![item(2)];
        update_pending(&pending, user, |r| r.items.clone_from(&items))
            .await
            .unwrap();

        let address = AddressId::new();
        let record = update_pending(&pending, user, |r| r.address_id = Some(address))
            .await
            .unwrap();

        assert_eq!(record.items, items);
        assert_eq!(record.address_id, Some(address));
    }

    #[tokio::test]
    async fn test_record_of_another_identity_is_invisible_and_replaced() {
        let pending = MemoryPendingStore::new();
        let alice = UserId::new();
        let bob = UserId::new();
        let address = AddressId::new();
        update_pending(&pending, alice, |r| {
            r.items = vec![item(1)];
            r.address_id = Some(address);
        })
        .await
        .unwrap();

        assert_eq!(load_owned(&pending, bob).await.unwrap(), None);
        assert!(load_owned(&pending, alice).await.unwrap().is_some());

        let record = update_pending(&pending, bob, |r| r.snapshot = None)
            .await
            .unwrap();
        assert_eq!(record.owner, Some(bob));
        assert!(record.items.is_empty());
        assert_eq!(record.address_id, None);
        assert_eq!(load_owned(&pending, alice).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_record_without_owner_is_not_resumed() {
        let pending = MemoryPendingStore::new();
        pending
            .save(&PendingOrder {
                address_id: Some(AddressId::new()),
                ..PendingOrder::default()
            })
            .await
            .unwrap();

        assert_eq!(load_owned(&pending, UserId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_operation() {
        let pending = MemoryPendingStore::new();
        pending.set_unavailable(true);

        assert!(pending.load().await.is_err());
        assert!(pending.save(&PendingOrder::default()).await.is_err());
        assert!(pending.clear().await.is_err());
        assert_eq!(pending.save_count(), 0);
    }

    #[tokio::test]
    async fn test_session_store_round_trips_one_record() {
        let session = Session::new(None, Arc::new(SessionMemoryStore::default()), None);
        let pending = SessionPendingStore::new(session.clone());

        let record = PendingOrder {
            owner: Some(UserId::new()),
            items: vec![item(3)],
            address_id: Some(AddressId::new()),
            ..PendingOrder::default()
        };
        pending.save(&record).await.unwrap();

        let reloaded = SessionPendingStore::new(session);
        assert_eq!(reloaded.load().await.unwrap(), Some(record));

        reloaded.clear().await.unwrap();
        assert_eq!(reloaded.load().await.unwrap(), None);
    }
}
