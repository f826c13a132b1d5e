//! Review queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use kirana_core::{ProductId, Rating, ReviewId, UserId};

use super::{PgStore, RepositoryError};
use crate::models::{NewReview, Review};
use crate::store::ReviewStore;

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    product_id: ProductId,
    user_id: UserId,
    rating: i16,
    review_text: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = Rating::new(row.rating)
            .map_err(|e| RepositoryError::DataCorruption(format!("review {}: {e}", row.id)))?;

        Ok(Self {
            id: row.id,
            product_id: row.product_id,
            user_id: row.user_id,
            rating,
            review_text: row.review_text,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn create_review(&self, review: &NewReview) -> Result<Review, RepositoryError> {
        let row: ReviewRow = sqlx::query_as(
            r"
            INSERT INTO storefront.review (product_id, user_id, rating, review_text)
            VALUES ($1, $2, $3, $4)
            RETURNING id, product_id, user_id, rating, review_text, created_at
            ",
        )
        .bind(review.product_id)
        .bind(review.user_id)
        .bind(i16::from(review.rating.value()))
        .bind(&review.review_text)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn list_reviews(&self, product_id: ProductId) -> Result<Vec<Review>, RepositoryError> {
        let rows: Vec<ReviewRow> = sqlx::query_as(
            r"
            SELECT id, product_id, user_id, rating, review_text, created_at
            FROM storefront.review
            WHERE product_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Review::try_from).collect()
    }
}
