//! Product review types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use kirana_core::{ProductId, Rating, ReviewId, UserId};

/// A submitted review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: Rating,
    pub review_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A validated review ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: Rating,
    pub review_text: Option<String>,
}

/// Average rating and review count for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatingSummary {
    /// Mean rating to one decimal place, `None` when there are no reviews.
    pub average: Option<Decimal>,
    pub count: usize,
}

impl RatingSummary {
    /// Summarise a set of reviews.
    #[must_use]
    pub fn from_reviews(reviews: &[Review]) -> Self {
        if reviews.is_empty() {
            return Self {
                average: None,
                count: 0,
            };
        }

        let total: Decimal = reviews
            .iter()
            .map(|r| Decimal::from(r.rating.value()))
            .sum();
        let average = (total / Decimal::from(reviews.len())).round_dp(1);

        Self {
            average: Some(average),
            count: reviews.len(),
        }
    }
}
