//! Checkout: the wizard, buy-now, and order submission.
//!
//! A checkout walks `AddressSelection -> LineConfirmation -> Payment` and ends
//! in `Completed` once the order is written. Progress is kept in the durable
//! [`crate::pending::PendingOrder`] record so any request (or a reload) can
//! pick it up again with [`CheckoutWizard::resume`].

mod buy_now;
mod in_flight;
mod snapshot;
mod submission;
mod wizard;

use rust_decimal::Decimal;
use thiserror::Error;

use kirana_core::{OrderId, ProductId};

pub use buy_now::start_buy_now;
pub use in_flight::{InFlightGuard, InFlightSubmissions};
pub use snapshot::{LineReview, OrderSnapshot, ReviewLine, SnapshotLine};
pub use submission::submit_order;
pub use wizard::{CheckoutStage, CheckoutWizard};

use crate::db::RepositoryError;
use crate::pending::PendingStateError;

/// Errors produced while checking out.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Local input problem. Nothing was sent to the store.
    #[error("{0}")]
    Validation(String),

    /// Products in the order could not be resolved. Nothing was written.
    #[error("{} product(s) are no longer available", missing.len())]
    ProductUnavailable { missing: Vec<ProductId> },

    /// Current prices no longer match what was confirmed. Nothing was written.
    #[error("prices changed since confirmation (confirmed {confirmed}, now {current})")]
    PriceChanged { confirmed: Decimal, current: Decimal },

    /// The store failed.
    #[error("store error: {0}")]
    Store(RepositoryError),

    /// The order header exists but its lines do not, and it could not be
    /// removed.
    #[error("order {order_id} could not be completed")]
    OrderIncomplete { order_id: OrderId },

    /// Another submission for the same identity is running.
    #[error("an order is already being placed")]
    SubmissionInProgress,

    /// The operation does not belong to the wizard's current stage.
    #[error("cannot do that during {actual} (expected {expected})")]
    WrongStage {
        expected: &'static str,
        actual: &'static str,
    },

    /// The durable pending record could not be read or written.
    #[error(transparent)]
    PendingState(#[from] PendingStateError),
}

impl From<RepositoryError> for CheckoutError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::OrphanedOrder { order_id, .. } => Self::OrderIncomplete { order_id },
            other => Self::Store(other),
        }
    }
}
