//! Product reviews.

use serde::Serialize;
use tracing::instrument;

use kirana_core::{ProductId, Rating, UserId};

use super::ServiceError;
use crate::models::{NewReview, RatingSummary, Review};
use crate::store::ReviewStore;

/// A product's reviews with their summary.
#[derive(Debug, Clone, Serialize)]
pub struct ProductReviews {
    pub summary: RatingSummary,
    pub reviews: Vec<Review>,
}

/// Review submission and listing.
pub struct ReviewService<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> ReviewService<'a, S>
where
    S: ReviewStore + ?Sized,
{
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Submit a review. The comment is trimmed; a blank comment is stored as
    /// no comment.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` (without a store call) for a
    /// rating outside 1 to 5.
    #[instrument(skip_all, fields(user_id = %user, %product_id, rating = rating))]
    pub async fn submit(
        &self,
        user: UserId,
        product_id: ProductId,
        rating: i32,
        comment: &str,
    ) -> Result<Review, ServiceError> {
        let rating = Rating::new(rating).map_err(|e| ServiceError::Validation(e.to_string()))?;
        let comment = comment.trim();

        let review = self
            .store
            .create_review(&NewReview {
                product_id,
                user_id: user,
                rating,
                review_text: (!comment.is_empty()).then(|| comment.to_string()),
            })
            .await?;

        tracing::info!(review_id = %review.id, "Review submitted");
        Ok(review)
    }

    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn list(&self, product_id: ProductId) -> Result<Vec<Review>, ServiceError> {
        Ok(self.store.list_reviews(product_id).await?)
    }

    /// Average rating and review count.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn summary(&self, product_id: ProductId) -> Result<RatingSummary, ServiceError> {
        let reviews = self.list(product_id).await?;
        Ok(RatingSummary::from_reviews(&reviews))
    }

    /// Reviews and summary from a single read.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn for_product(&self, product_id: ProductId) -> Result<ProductReviews, ServiceError> {
        let reviews = self.list(product_id).await?;
        Ok(ProductReviews {
            summary: RatingSummary::from_reviews(&reviews),
            reviews,
        })
    }
}
