//! Business logic services for storefront.
//!
//! # Services
//!
//! - `cart` - Cart rows for the signed-in identity
//! - `orders` - Order history and order detail
//! - `reviews` - Product reviews and rating summaries
//! - `search` - Product search
//!
//! Checkout lives in [`crate::checkout`].

pub mod cart;
pub mod orders;
pub mod reviews;
pub mod search;

use thiserror::Error;

pub use cart::CartService;
pub use orders::{OrderDetail, OrderDetailLine, OrderService, OrderSummary};
pub use reviews::{ProductReviews, ReviewService};
pub use search::{SEARCH_RESULT_LIMIT, search_products};

use crate::db::RepositoryError;

/// Errors from the storefront services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid input; nothing was sent to the store.
    #[error("{0}")]
    Validation(String),

    /// The requested entity does not exist for this identity.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The store failed.
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("record"),
            other => Self::Repository(other),
        }
    }
}
