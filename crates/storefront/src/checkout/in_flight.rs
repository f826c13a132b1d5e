//! One order submission per identity at a time.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use kirana_core::UserId;

/// Identities with a submission currently running.
///
/// Cloning shares the registry; one instance lives in the application state
/// and is handed to every wizard.
#[derive(Debug, Clone, Default)]
pub struct InFlightSubmissions {
    active: Arc<Mutex<HashSet<UserId>>>,
}

impl InFlightSubmissions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `user` as submitting. Returns `None` if a submission for `user`
    /// is already running; otherwise the mark is held until the guard drops.
    #[must_use]
    pub fn try_begin(&self, user: UserId) -> Option<InFlightGuard> {
        let inserted = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user);

        inserted.then(|| InFlightGuard {
            active: Arc::clone(&self.active),
            user,
        })
    }

    /// Whether `user` has a submission running.
    #[must_use]
    pub fn is_active(&self, user: UserId) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&user)
    }
}

/// Releases the in-flight mark on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<Mutex<HashSet<UserId>>>,
    user: UserId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.user);
    }
}
