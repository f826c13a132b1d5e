//! Product catalogue types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kirana_core::ProductId;

/// A catalogue product with its current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: Option<String>,
    /// Current selling price.
    pub price: Decimal,
    /// Maximum retail price (shown struck through).
    pub mrp: Decimal,
    pub thumbnail_url: Option<String>,
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// The subset of a product needed to render a cart or checkout line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub thumbnail_url: Option<String>,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
            thumbnail_url: product.thumbnail_url.clone(),
        }
    }
}

/// Product fields for seeding the catalogue.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    pub mrp: Decimal,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}
