//! Line review and the confirmed order snapshot.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kirana_core::{CurrencyCode, ProductId, line_total};

use super::CheckoutError;
use crate::models::{CartLine, OrderItem, Product};

/// One line as shown on the confirmation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewLine {
    pub product_id: ProductId,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub subtotal: Decimal,
}

/// The lines about to be ordered, priced with current product data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineReview {
    pub lines: Vec<ReviewLine>,
    pub total: Decimal,
    pub currency: CurrencyCode,
}

impl LineReview {
    fn new(lines: Vec<ReviewLine>, currency: CurrencyCode) -> Self {
        let total = lines.iter().map(|line| line.subtotal).sum();
        Self {
            lines,
            total,
            currency,
        }
    }

    /// Review the identity's cart.
    #[must_use]
    pub fn from_cart(cart: &[CartLine], currency: CurrencyCode) -> Self {
        let lines = cart
            .iter()
            .map(|line| ReviewLine {
                product_id: line.product.id,
                title: line.product.title.clone(),
                thumbnail_url: line.product.thumbnail_url.clone(),
                unit_price: line.product.price,
                quantity: line.quantity,
                subtotal: line.subtotal(),
            })
            .collect();
        Self::new(lines, currency)
    }

    /// Review explicit items against resolved `products`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::ProductUnavailable`] if any item's product is
    /// not among `products`.
    pub fn from_items(
        items: &[OrderItem],
        products: &[Product],
        currency: CurrencyCode,
    ) -> Result<Self, CheckoutError> {
        let by_id = index_products(products);
        let missing = missing_products(items.iter().map(|i| i.product_id), &by_id);
        if !missing.is_empty() {
            return Err(CheckoutError::ProductUnavailable { missing });
        }

        let lines = items
            .iter()
            .filter_map(|item| {
                by_id.get(&item.product_id).map(|product| ReviewLine {
                    product_id: product.id,
                    title: product.title.clone(),
                    thumbnail_url: product.thumbnail_url.clone(),
                    unit_price: product.price,
                    quantity: item.quantity,
                    subtotal: line_total(product.price, item.quantity),
                })
            })
            .collect();
        Ok(Self::new(lines, currency))
    }

    /// Freeze the reviewed lines into an immutable snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Validation`] if there are no lines.
    pub fn freeze(&self) -> Result<OrderSnapshot, CheckoutError> {
        if self.lines.is_empty() {
            return Err(CheckoutError::Validation(
                "There is nothing to order.".to_string(),
            ));
        }

        Ok(OrderSnapshot {
            lines: self
                .lines
                .iter()
                .map(|line| SnapshotLine {
                    product_id: line.product_id,
                    title: line.title.clone(),
                    unit_price: line.unit_price,
                    quantity: line.quantity,
                })
                .collect(),
            total: self.total,
            currency: self.currency,
            confirmed_at: Utc::now(),
        })
    }
}

/// A confirmed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotLine {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl SnapshotLine {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        line_total(self.unit_price, self.quantity)
    }
}

/// Lines and total exactly as the user confirmed them.
///
/// Only [`LineReview::freeze`] creates one; it is never edited afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    lines: Vec<SnapshotLine>,
    total: Decimal,
    currency: CurrencyCode,
    confirmed_at: DateTime<Utc>,
}

impl OrderSnapshot {
    #[must_use]
    pub fn lines(&self) -> &[SnapshotLine] {
        &self.lines
    }

    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    #[must_use]
    pub const fn confirmed_at(&self) -> DateTime<Utc> {
        self.confirmed_at
    }

    /// Distinct product ids, in first-seen order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        unique_ids(self.lines.iter().map(|line| line.product_id))
    }
}

/// Deduplicate ids, keeping first-seen order.
pub(crate) fn unique_ids(ids: impl IntoIterator<Item = ProductId>) -> Vec<ProductId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

pub(crate) fn index_products(products: &[Product]) -> HashMap<ProductId, &Product> {
    products.iter().map(|p| (p.id, p)).collect()
}

/// Requested ids with no resolved product, deduplicated.
pub(crate) fn missing_products(
    requested: impl IntoIterator<Item = ProductId>,
    resolved: &HashMap<ProductId, &Product>,
) -> Vec<ProductId> {
    unique_ids(requested)
        .into_iter()
        .filter(|id| !resolved.contains_key(id))
        .collect()
}
