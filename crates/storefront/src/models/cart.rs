//! Cart line types.

use rust_decimal::Decimal;
use serde::Serialize;

use kirana_core::{CartLineId, line_total};

use super::ProductSummary;

/// One row of the current identity's cart, joined with its product.
///
/// `quantity` is always at least 1; setting it to zero removes the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub product: ProductSummary,
    pub quantity: u32,
}

impl CartLine {
    /// `product.price * quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        line_total(self.product.price, self.quantity)
    }
}

/// Aggregates shown next to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    /// Sum of quantities.
    pub item_count: u32,
    pub subtotal: Decimal,
}

impl CartTotals {
    /// Sum quantities and subtotals over `lines`.
    #[must_use]
    pub fn from_lines(lines: &[CartLine]) -> Self {
        lines.iter().fold(
            Self {
                item_count: 0,
                subtotal: Decimal::ZERO,
            },
            |acc, line| Self {
                item_count: acc.item_count.saturating_add(line.quantity),
                subtotal: acc.subtotal + line.subtotal(),
            },
        )
    }
}
