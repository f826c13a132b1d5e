//! Order types.
//!
//! Order lines carry a snapshot of the product title and unit price taken at
//! checkout. Later product edits never change what a placed order shows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kirana_core::{AddressId, CurrencyCode, OrderId, OrderLineId, OrderStatus, ProductId, line_total};

/// A product reference and quantity, as held in the pending-order record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A persisted order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub address_id: AddressId,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub currency: CurrencyCode,
    pub created_at: DateTime<Utc>,
}

/// A persisted order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    /// Product title at the time the order was placed.
    pub product_title: String,
    /// Unit price at the time the order was placed.
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderLine {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        line_total(self.unit_price, self.quantity)
    }
}

/// Order header fields to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub address_id: AddressId,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub currency: CurrencyCode,
}

/// Order line fields to persist under a freshly created header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub product_title: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}
