//! Product catalogue queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use kirana_core::ProductId;

use super::{PgStore, RepositoryError};
use crate::models::{NewProduct, Product};
use crate::store::ProductStore;

const PRODUCT_COLUMNS: &str =
    "id, title, description, price, mrp, thumbnail_url, image_urls, created_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    title: String,
    description: Option<String>,
    price: Decimal,
    mrp: Decimal,
    thumbnail_url: Option<String>,
    image_urls: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            price: row.price,
            mrp: row.mrp,
            thumbnail_url: row.thumbnail_url,
            image_urls: row.image_urls,
            created_at: row.created_at,
        }
    }
}

/// Escape `LIKE` metacharacters so a search term matches literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

impl PgStore {
    /// Insert a product, or update the existing one with the same title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row: ProductRow = sqlx::query_as(&format!(
            r"
            INSERT INTO storefront.product
                (title, description, price, mrp, thumbnail_url, image_urls)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (title) DO UPDATE SET
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                mrp = EXCLUDED.mrp,
                thumbnail_url = EXCLUDED.thumbnail_url,
                image_urls = EXCLUDED.image_urls
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.mrp)
        .bind(&product.thumbnail_url)
        .bind(&product.image_urls)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn get_products_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<Uuid> = ids.iter().map(ProductId::as_uuid).collect();

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product ORDER BY title"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn search_products(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<Product>, RepositoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM storefront.product
            WHERE title ILIKE $1 OR description ILIKE $1
            ORDER BY title
            LIMIT $2
            "
        ))
        .bind(like_pattern(term))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }
}
