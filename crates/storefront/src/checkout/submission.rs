//! Order submission.

use rust_decimal::Decimal;
use tracing::instrument;

use kirana_core::{AddressId, OrderId, OrderStatus, UserId, line_total};

use super::CheckoutError;
use super::snapshot::{OrderSnapshot, index_products, missing_products};
use crate::models::{NewOrder, NewOrderLine};
use crate::store::{OrderStore, ProductStore};

/// Turn a confirmed snapshot into a persisted order.
///
/// Every product in the snapshot is re-read from the store first. If any of
/// them no longer exists, or the current prices add up to a different total
/// than the one the user confirmed, nothing is written. Otherwise the header
/// and lines are persisted through [`OrderStore::place_order`] with the
/// confirmed prices.
///
/// # Errors
///
/// - [`CheckoutError::ProductUnavailable`] when products have disappeared
/// - [`CheckoutError::PriceChanged`] when the current total differs
/// - [`CheckoutError::Store`] or [`CheckoutError::OrderIncomplete`] when
///   persisting fails
#[instrument(
    skip_all,
    fields(user_id = %user, %address_id, line_count = snapshot.lines().len())
)]
pub async fn submit_order<S>(
    store: &S,
    user: UserId,
    address_id: AddressId,
    snapshot: &OrderSnapshot,
) -> Result<OrderId, CheckoutError>
where
    S: ProductStore + OrderStore + ?Sized,
{
    if snapshot.lines().is_empty() {
        return Err(CheckoutError::Validation(
            "There is nothing to order.".to_string(),
        ));
    }

    let products = store.get_products_by_ids(&snapshot.product_ids()).await?;
    let by_id = index_products(&products);

    let missing = missing_products(snapshot.lines().iter().map(|l| l.product_id), &by_id);
    if !missing.is_empty() {
        tracing::warn!(missing = missing.len(), "Products unavailable at submission");
        return Err(CheckoutError::ProductUnavailable { missing });
    }

    let mut current = Decimal::ZERO;
    let mut lines = Vec::with_capacity(snapshot.lines().len());
    for line in snapshot.lines() {
        let product = by_id
            .get(&line.product_id)
            .ok_or_else(|| CheckoutError::ProductUnavailable {
                missing: vec![line.product_id],
            })?;
        current += line_total(product.price, line.quantity);
        lines.push(NewOrderLine {
            product_id: line.product_id,
            product_title: line.title.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
        });
    }

    if current != snapshot.total() {
        tracing::info!(
            confirmed = %snapshot.total(),
            %current,
            "Prices changed since confirmation"
        );
        return Err(CheckoutError::PriceChanged {
            confirmed: snapshot.total(),
            current,
        });
    }

    let order = NewOrder {
        address_id,
        status: OrderStatus::Pending,
        total_amount: snapshot.total(),
        currency: snapshot.currency(),
    };

    let order_id = store.place_order(user, &order, &lines).await?;
    tracing::info!(%order_id, total = %order.total_amount, "Order placed");

    Ok(order_id)
}
