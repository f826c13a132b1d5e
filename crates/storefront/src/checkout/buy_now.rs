//! "Buy now": check out specific lines without touching the cart.

use tracing::instrument;

use kirana_core::UserId;

use super::CheckoutError;
use crate::models::OrderItem;
use crate::pending::{PendingOrder, PendingOrderStore, update_pending};

/// Replace `user`'s pending items with `items`.
///
/// A previously chosen address is kept; a confirmed snapshot is dropped
/// because it described other lines.
///
/// # Errors
///
/// Returns [`CheckoutError::Validation`] for an empty list or a zero
/// quantity, or [`CheckoutError::PendingState`] if the record cannot be
/// saved.
#[instrument(skip_all, fields(user_id = %user, line_count = items.len()))]
pub async fn start_buy_now<P>(
    pending: &P,
    user: UserId,
    items: Vec<OrderItem>,
) -> Result<PendingOrder, CheckoutError>
where
    P: PendingOrderStore + ?Sized,
{
    if items.is_empty() {
        return Err(CheckoutError::Validation(
            "Choose at least one product.".to_string(),
        ));
    }
    if items.iter().any(|item| item.quantity == 0) {
        return Err(CheckoutError::Validation(
            "Quantity must be at least 1.".to_string(),
        ));
    }

    let record = update_pending(pending, user, move |record| {
        record.items = items;
        record.snapshot = None;
    })
    .await?;

    Ok(record)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pending::MemoryPendingStore;
    use kirana_core::{AddressId, ProductId};

    #[tokio::test]
    async fn test_buy_now_replaces_items_and_keeps_address() {
        let pending = MemoryPendingStore::new();
        let user = UserId::new();
        let address = AddressId::new();
        update_pending(&pending, user, |r| {
            r.address_id = Some(address);
            r.items = vec![OrderItem {
                product_id: ProductId::new(),
                quantity: 9,
            }];
        })
        .await
        .unwrap();

        let c = ProductId::new();
        let record = start_buy_now(
            &pending,
            user,
            vec![OrderItem {
                product_id: c,
                quantity: 3,
            }],
        )
        .await
        .unwrap();

        assert_eq!(
            record.items,
            vec![OrderItem {
                product_id: c,
                quantity: 3
            }]
        );
        assert_eq!(record.address_id, Some(address));
        assert!(record.snapshot.is_none());
    }

    #[tokio::test]
    async fn test_buy_now_rejects_empty_and_zero_quantity() {
        let pending = MemoryPendingStore::new();
        let user = UserId::new();

        assert!(matches!(
            start_buy_now(&pending, user, Vec::new()).await,
            Err(CheckoutError::Validation(_))
        ));
        assert!(matches!(
            start_buy_now(
                &pending,
                user,
                vec![OrderItem {
                    product_id: ProductId::new(),
                    quantity: 0
                }]
            )
            .await,
            Err(CheckoutError::Validation(_))
        ));
        assert_eq!(pending.save_count(), 0);
    }
}
