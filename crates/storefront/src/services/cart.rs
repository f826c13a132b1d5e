//! Cart operations.
//!
//! The store holds the cart; this service only applies the add and
//! quantity rules. Concurrent edits from two tabs are last-write-wins.

use tracing::instrument;

use kirana_core::{CartLineId, ProductId, UserId};

use super::ServiceError;
use crate::models::{CartLine, CartTotals};
use crate::store::{CartStore, ProductStore};

/// Cart operations for one store.
pub struct CartService<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> CartService<'a, S>
where
    S: CartStore + ProductStore + ?Sized,
{
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The identity's cart lines.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn lines(&self, user: UserId) -> Result<Vec<CartLine>, ServiceError> {
        Ok(self.store.list_cart(user).await?)
    }

    /// The identity's cart lines with totals.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn view(&self, user: UserId) -> Result<(Vec<CartLine>, CartTotals), ServiceError> {
        let lines = self.lines(user).await?;
        let totals = CartTotals::from_lines(&lines);
        Ok((lines, totals))
    }

    /// Add one of `product_id`: bump an existing line, or start a new one.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for an unknown product.
    #[instrument(skip_all, fields(user_id = %user, %product_id))]
    pub async fn add(&self, user: UserId, product_id: ProductId) -> Result<(), ServiceError> {
        if let Some(line) = self.store.find_cart_line(user, product_id).await? {
            let quantity = line.quantity.saturating_add(1);
            self.store.set_cart_quantity(user, line.id, quantity).await?;
            tracing::debug!(quantity, "Cart line incremented");
            return Ok(());
        }

        if self.store.get_product(product_id).await?.is_none() {
            return Err(ServiceError::NotFound("product"));
        }
        self.store.insert_cart_line(user, product_id, 1).await?;
        tracing::debug!("Cart line added");
        Ok(())
    }

    /// Set a line's quantity. Zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the line is not the identity's.
    #[instrument(skip_all, fields(user_id = %user, %line_id))]
    pub async fn update_quantity(
        &self,
        user: UserId,
        line_id: CartLineId,
        quantity: i64,
    ) -> Result<(), ServiceError> {
        if quantity <= 0 {
            return self.remove(user, line_id).await;
        }
        let quantity = u32::try_from(quantity)
            .map_err(|_| ServiceError::Validation("Quantity is too large.".to_string()))?;
        self.store.set_cart_quantity(user, line_id, quantity).await?;
        Ok(())
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the line is not the identity's.
    pub async fn remove(&self, user: UserId, line_id: CartLineId) -> Result<(), ServiceError> {
        self.store.delete_cart_line(user, line_id).await?;
        Ok(())
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn clear(&self, user: UserId) -> Result<(), ServiceError> {
        self.store.clear_cart(user).await?;
        Ok(())
    }
}
