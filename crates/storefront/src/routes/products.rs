//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use kirana_core::ProductId;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Product, ProductSummary, RatingSummary, Review};
use crate::services::{ProductReviews, ReviewService, search_products};
use crate::state::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Product detail response.
#[derive(Debug, Serialize)]
pub struct ProductPage {
    #[serde(flatten)]
    pub product: Product,
    pub rating: RatingSummary,
}

/// Review submission body.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

/// The catalogue, ordered by title.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ProductSummary>>> {
    let products = state.store().list_products().await?;
    Ok(Json(products.iter().map(ProductSummary::from).collect()))
}

/// Search products by title or description.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ProductSummary>>> {
    Ok(Json(search_products(state.store(), &query.q).await?))
}

/// Product detail with its rating summary.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductPage>> {
    let product = state
        .store()
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound("product".to_string()))?;
    let rating = ReviewService::new(state.store()).summary(id).await?;

    Ok(Json(ProductPage { product, rating }))
}

/// Reviews of a product with the summary.
#[instrument(skip(state))]
pub async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductReviews>> {
    Ok(Json(ReviewService::new(state.store()).for_product(id).await?))
}

/// Submit a review.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %id))]
pub async fn create_review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
    Json(request): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<Review>)> {
    let review = ReviewService::new(state.store())
        .submit(user.id, id, request.rating, &request.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}
