//! The checkout wizard.

use serde::Serialize;
use tracing::instrument;

use kirana_core::{AddressId, CurrencyCode, OrderId, UserId};

use super::snapshot::unique_ids;
use super::{CheckoutError, InFlightSubmissions, LineReview, OrderSnapshot, submit_order};
use crate::models::{Address, AddressForm};
use crate::pending::{PendingOrderStore, load_owned, update_pending};
use crate::store::{AddressStore, CartStore, OrderStore, ProductStore};

/// Where a checkout currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum CheckoutStage {
    AddressSelection,
    LineConfirmation,
    Payment,
    Completed { order_id: OrderId },
}

impl CheckoutStage {
    /// Short name used in errors and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AddressSelection => "address selection",
            Self::LineConfirmation => "line confirmation",
            Self::Payment => "payment",
            Self::Completed { .. } => "completed",
        }
    }
}

/// Drives one identity's checkout.
///
/// A wizard is built per request with [`CheckoutWizard::resume`]; all state
/// that must outlive the request is written to the pending record.
pub struct CheckoutWizard<'a, S: ?Sized, P: ?Sized> {
    store: &'a S,
    pending: &'a P,
    user: UserId,
    in_flight: InFlightSubmissions,
    currency: CurrencyCode,
    stage: CheckoutStage,
    selected_address: Option<AddressId>,
    snapshot: Option<OrderSnapshot>,
}

impl<'a, S, P> CheckoutWizard<'a, S, P>
where
    S: AddressStore + ProductStore + OrderStore + CartStore + ?Sized,
    P: PendingOrderStore + ?Sized,
{
    /// Pick up `user`'s checkout from the pending record.
    ///
    /// With an address and a confirmed snapshot the wizard starts at
    /// `Payment`, with only an address at `LineConfirmation`, and otherwise
    /// at `AddressSelection`. A record owned by another identity, or one
    /// whose address is not among `user`'s addresses, starts over at
    /// `AddressSelection`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::PendingState`] if the record cannot be read,
    /// or [`CheckoutError::Store`] if the stored address cannot be checked.
    pub async fn resume(
        store: &'a S,
        pending: &'a P,
        user: UserId,
        in_flight: InFlightSubmissions,
        currency: CurrencyCode,
    ) -> Result<Self, CheckoutError> {
        let record = load_owned(pending, user).await?;
        let (mut selected_address, mut snapshot) =
            record.map_or((None, None), |r| (r.address_id, r.snapshot));

        if let Some(address_id) = selected_address {
            let addresses = store.list_addresses(user).await?;
            if !addresses.iter().any(|a| a.id == address_id) {
                tracing::warn!(
                    user_id = %user,
                    %address_id,
                    "Pending address is not the identity's"
                );
                selected_address = None;
                snapshot = None;
            }
        }

        let (stage, snapshot) = match (selected_address, snapshot) {
            (Some(_), Some(snapshot)) => (CheckoutStage::Payment, Some(snapshot)),
            (Some(_), None) => (CheckoutStage::LineConfirmation, None),
            (None, _) => (CheckoutStage::AddressSelection, None),
        };

        tracing::debug!(user_id = %user, stage = stage.name(), "Checkout resumed");

        Ok(Self {
            store,
            pending,
            user,
            in_flight,
            currency,
            stage,
            selected_address,
            snapshot,
        })
    }

    #[must_use]
    pub const fn stage(&self) -> CheckoutStage {
        self.stage
    }

    #[must_use]
    pub const fn selected_address(&self) -> Option<AddressId> {
        self.selected_address
    }

    /// The confirmed lines, once past `LineConfirmation`.
    #[must_use]
    pub const fn snapshot(&self) -> Option<&OrderSnapshot> {
        self.snapshot.as_ref()
    }

    fn expect_stage(&self, expected: CheckoutStage) -> Result<(), CheckoutError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(CheckoutError::WrongStage {
                expected: expected.name(),
                actual: self.stage.name(),
            })
        }
    }

    /// The identity's saved addresses.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Store`] if the store fails.
    pub async fn addresses(&self) -> Result<Vec<Address>, CheckoutError> {
        Ok(self.store.list_addresses(self.user).await?)
    }

    /// Validate and save a new address, then select it.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Validation`] (without a store call) if any
    /// field is empty, or [`CheckoutError::Store`] if saving fails.
    #[instrument(skip_all, fields(user_id = %self.user))]
    pub async fn create_address(&mut self, form: &AddressForm) -> Result<Address, CheckoutError> {
        self.expect_stage(CheckoutStage::AddressSelection)?;
        let address = form
            .validate()
            .map_err(|e| CheckoutError::Validation(e.to_string()))?;

        let address = self.store.create_address(self.user, &address).await?;
        tracing::info!(address_id = %address.id, "Address created");
        self.selected_address = Some(address.id);
        Ok(address)
    }

    /// Select one of the identity's saved addresses.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Validation`] if `address_id` is not one of
    /// the identity's addresses.
    pub async fn select_address(&mut self, address_id: AddressId) -> Result<(), CheckoutError> {
        self.expect_stage(CheckoutStage::AddressSelection)?;
        let addresses = self.store.list_addresses(self.user).await?;
        if !addresses.iter().any(|a| a.id == address_id) {
            return Err(CheckoutError::Validation(
                "That address is not one of yours.".to_string(),
            ));
        }
        self.selected_address = Some(address_id);
        Ok(())
    }

    /// Record the selected address and move on to reviewing lines.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Validation`] if no address is selected; the
    /// wizard is left as it was and nothing is read or written.
    #[instrument(skip_all, fields(user_id = %self.user))]
    pub async fn continue_to_confirmation(&mut self) -> Result<(), CheckoutError> {
        self.expect_stage(CheckoutStage::AddressSelection)?;
        let Some(address_id) = self.selected_address else {
            return Err(CheckoutError::Validation(
                "Please select an address.".to_string(),
            ));
        };

        update_pending(self.pending, self.user, |record| {
            record.address_id = Some(address_id);
            record.snapshot = None;
        })
        .await?;

        self.snapshot = None;
        self.stage = CheckoutStage::LineConfirmation;
        Ok(())
    }

    /// Price the lines about to be ordered with current product data.
    ///
    /// Buy-now items are used when present, otherwise the whole cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::ProductUnavailable`] if a buy-now product no
    /// longer exists, or a store/pending-state error.
    pub async fn review_lines(&self) -> Result<LineReview, CheckoutError> {
        self.expect_stage(CheckoutStage::LineConfirmation)?;

        let items = load_owned(self.pending, self.user)
            .await?
            .map(|record| record.items)
            .unwrap_or_default();

        if items.is_empty() {
            let cart = self.store.list_cart(self.user).await?;
            return Ok(LineReview::from_cart(&cart, self.currency));
        }

        let ids = unique_ids(items.iter().map(|item| item.product_id));
        let products = self.store.get_products_by_ids(&ids).await?;
        LineReview::from_items(&items, &products, self.currency)
    }

    /// Freeze the reviewed lines and move on to payment.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Validation`] if there is nothing to order,
    /// plus any error from [`Self::review_lines`].
    #[instrument(skip_all, fields(user_id = %self.user))]
    pub async fn confirm_lines(&mut self) -> Result<&OrderSnapshot, CheckoutError> {
        let review = self.review_lines().await?;
        let snapshot = review.freeze()?;

        let stored = snapshot.clone();
        update_pending(self.pending, self.user, move |record| {
            record.snapshot = Some(stored);
        })
        .await?;

        tracing::info!(
            total = %snapshot.total(),
            line_count = snapshot.lines().len(),
            "Lines confirmed"
        );
        self.stage = CheckoutStage::Payment;
        Ok(&*self.snapshot.insert(snapshot))
    }

    /// Step back one stage. Leaving `Payment` discards the confirmed lines;
    /// leaving `LineConfirmation` un-records the chosen address.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::WrongStage`] from `AddressSelection` or
    /// `Completed`.
    pub async fn back(&mut self) -> Result<(), CheckoutError> {
        match self.stage {
            CheckoutStage::LineConfirmation => {
                // The selection stays pre-filled here, but a resumed wizard
                // must start from address selection again.
                update_pending(self.pending, self.user, |record| {
                    record.address_id = None;
                    record.snapshot = None;
                })
                .await?;
                self.stage = CheckoutStage::AddressSelection;
                Ok(())
            }
            CheckoutStage::Payment => {
                update_pending(self.pending, self.user, |record| record.snapshot = None).await?;
                self.snapshot = None;
                self.stage = CheckoutStage::LineConfirmation;
                Ok(())
            }
            CheckoutStage::AddressSelection | CheckoutStage::Completed { .. } => {
                Err(CheckoutError::WrongStage {
                    expected: "line confirmation or payment",
                    actual: self.stage.name(),
                })
            }
        }
    }

    /// Place the order from the confirmed snapshot.
    ///
    /// On success the pending record is cleared and the wizard is
    /// `Completed`. On failure it stays at `Payment` with the pending record
    /// untouched, so the same order can be retried.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::SubmissionInProgress`] if another submission
    /// for the identity is running, or any error from [`submit_order`].
    #[instrument(skip_all, fields(user_id = %self.user))]
    pub async fn place_order(&mut self) -> Result<OrderId, CheckoutError> {
        self.expect_stage(CheckoutStage::Payment)?;
        let (Some(address_id), Some(snapshot)) = (self.selected_address, self.snapshot.as_ref())
        else {
            return Err(CheckoutError::Validation(
                "Confirm your address and items first.".to_string(),
            ));
        };

        let Some(_guard) = self.in_flight.try_begin(self.user) else {
            tracing::warn!("Submission already in flight");
            return Err(CheckoutError::SubmissionInProgress);
        };

        let order_id = match submit_order(self.store, self.user, address_id, snapshot).await {
            Ok(order_id) => order_id,
            Err(err) => {
                tracing::warn!(error = %err, "Order submission failed");
                return Err(err);
            }
        };

        // The order exists; failing here must not invite a second submission.
        if let Err(err) = self.pending.clear().await {
            tracing::error!(%order_id, error = %err, "Failed to clear pending order");
        }

        self.snapshot = None;
        self.stage = CheckoutStage::Completed { order_id };
        Ok(order_id)
    }
}
