//! Order history and detail.
//!
//! Orders are read back exactly as they were written: titles and prices come
//! from the line snapshots, never from the current catalogue. Only the
//! thumbnail is looked up live, and only while the product still exists.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use kirana_core::{OrderId, UserId};

use super::ServiceError;
use crate::models::{Order, OrderLine};
use crate::store::{OrderStore, ProductStore};

/// An order with its lines, for the history list.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// A line on the order detail page.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetailLine {
    #[serde(flatten)]
    pub line: OrderLine,
    pub subtotal: Decimal,
    pub thumbnail_url: Option<String>,
}

/// An order with display-ready lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderDetailLine>,
}

/// Read access to an identity's orders.
pub struct OrderService<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> OrderService<'a, S>
where
    S: OrderStore + ProductStore + ?Sized,
{
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The identity's orders, newest first, each with its lines.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    #[instrument(skip_all, fields(user_id = %user))]
    pub async fn history(&self, user: UserId) -> Result<Vec<OrderSummary>, ServiceError> {
        let orders = self.store.list_orders(user).await?;
        let mut summaries = Vec::with_capacity(orders.len());
        for order in orders {
            let lines = self.store.list_order_lines(order.id).await?;
            summaries.push(OrderSummary { order, lines });
        }
        Ok(summaries)
    }

    /// One of the identity's orders.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the order does not exist or
    /// belongs to someone else.
    #[instrument(skip_all, fields(user_id = %user, %order_id))]
    pub async fn detail(&self, user: UserId, order_id: OrderId) -> Result<OrderDetail, ServiceError> {
        let order = self
            .store
            .get_order(user, order_id)
            .await?
            .ok_or(ServiceError::NotFound("order"))?;
        let lines = self.store.list_order_lines(order.id).await?;

        let ids: Vec<_> = lines.iter().map(|line| line.product_id).collect();
        let products = self.store.get_products_by_ids(&ids).await?;
        let thumbnails: HashMap<_, _> = products
            .into_iter()
            .map(|p| (p.id, p.thumbnail_url))
            .collect();

        let lines = lines
            .into_iter()
            .map(|line| OrderDetailLine {
                subtotal: line.subtotal(),
                thumbnail_url: thumbnails.get(&line.product_id).cloned().flatten(),
                line,
            })
            .collect();

        Ok(OrderDetail { order, lines })
    }
}

impl OrderDetail {
    /// Sum of line subtotals. Equals the stored total for any order placed
    /// through checkout.
    #[must_use]
    pub fn lines_total(&self) -> Decimal {
        self.lines.iter().map(|line| line.subtotal).sum()
    }
}
