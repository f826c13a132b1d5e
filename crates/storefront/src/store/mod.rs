//! Collaborator traits for the managed data store.
//!
//! The checkout wizard and the services only ever talk to the store through
//! these traits. [`crate::db::PgStore`] implements them against `PostgreSQL`;
//! [`memory::MemoryStore`] implements them in process for tests and local
//! runs. Every operation is scoped to the identity it is given.

pub mod memory;

use async_trait::async_trait;

use kirana_core::{CartLineId, OrderId, ProductId, UserId};

pub use crate::db::RepositoryError;
use crate::models::{
    Address, CartLine, NewAddress, NewOrder, NewOrderLine, NewReview, Order, OrderLine, Product,
    Review,
};

/// Saved shipping addresses.
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// All addresses saved by `user`, oldest first.
    async fn list_addresses(&self, user: UserId) -> Result<Vec<Address>, RepositoryError>;

    /// Persist a new address for `user`.
    async fn create_address(
        &self,
        user: UserId,
        address: &NewAddress,
    ) -> Result<Address, RepositoryError>;
}

/// Product catalogue reads.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Products matching `ids`. Ids that do not resolve are simply absent
    /// from the result; callers compare counts.
    async fn get_products_by_ids(&self, ids: &[ProductId])
    -> Result<Vec<Product>, RepositoryError>;

    /// A single product.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// The whole catalogue, ordered by title.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Case-insensitive substring match on title or description.
    async fn search_products(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<Product>, RepositoryError>;
}

/// Order headers and lines.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Write an order header and return its generated id.
    async fn create_order(&self, user: UserId, order: &NewOrder)
    -> Result<OrderId, RepositoryError>;

    /// Write the lines of an existing order.
    async fn create_order_lines(
        &self,
        order_id: OrderId,
        lines: &[NewOrderLine],
    ) -> Result<(), RepositoryError>;

    /// Remove an order header (and any lines it has).
    async fn delete_order(&self, order_id: OrderId) -> Result<(), RepositoryError>;

    /// Record an order with its lines.
    ///
    /// The default writes the header, then the lines. If the lines fail the
    /// orphaned header is deleted again; if that also fails the header is
    /// reported as [`RepositoryError::OrphanedOrder`]. Stores that support
    /// transactions override this with a single atomic write.
    async fn place_order(
        &self,
        user: UserId,
        order: &NewOrder,
        lines: &[NewOrderLine],
    ) -> Result<OrderId, RepositoryError> {
        let order_id = self.create_order(user, order).await?;

        if let Err(err) = self.create_order_lines(order_id, lines).await {
            tracing::warn!(%order_id, error = %err, "Order lines failed, removing header");

            if let Err(cleanup) = self.delete_order(order_id).await {
                tracing::error!(
                    %order_id,
                    error = %cleanup,
                    "Failed to remove order header after line failure"
                );
                return Err(RepositoryError::OrphanedOrder {
                    order_id,
                    reason: format!("{err}; cleanup failed: {cleanup}"),
                });
            }

            return Err(err);
        }

        Ok(order_id)
    }

    /// Orders placed by `user`, newest first.
    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// One order, only if it belongs to `user`.
    async fn get_order(
        &self,
        user: UserId,
        order_id: OrderId,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Lines of an order in the order they were written.
    async fn list_order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError>;
}

/// Cart rows for an identity.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The identity's cart joined with product summaries.
    async fn list_cart(&self, user: UserId) -> Result<Vec<CartLine>, RepositoryError>;

    /// The cart row holding `product_id`, if any.
    async fn find_cart_line(
        &self,
        user: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartLine>, RepositoryError>;

    /// Insert a new cart row.
    async fn insert_cart_line(
        &self,
        user: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLineId, RepositoryError>;

    /// Overwrite the quantity of a row. `NotFound` if the row is not the
    /// identity's.
    async fn set_cart_quantity(
        &self,
        user: UserId,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<(), RepositoryError>;

    /// Delete one row. `NotFound` if the row is not the identity's.
    async fn delete_cart_line(&self, user: UserId, line_id: CartLineId)
    -> Result<(), RepositoryError>;

    /// Delete every row of the identity's cart.
    async fn clear_cart(&self, user: UserId) -> Result<(), RepositoryError>;
}

/// Product reviews.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Persist a review.
    async fn create_review(&self, review: &NewReview) -> Result<Review, RepositoryError>;

    /// Reviews of a product, newest first.
    async fn list_reviews(&self, product_id: ProductId) -> Result<Vec<Review>, RepositoryError>;
}

/// Everything the storefront needs from its data store.
#[async_trait]
pub trait Store: AddressStore + ProductStore + OrderStore + CartStore + ReviewStore {
    /// Cheap connectivity check for the readiness endpoint.
    async fn ping(&self) -> Result<(), RepositoryError>;
}
