//! Cart queries.

use async_trait::async_trait;
use rust_decimal::Decimal;

use kirana_core::{CartLineId, ProductId, UserId};

use super::{PgStore, RepositoryError, quantity_from_db, quantity_to_db};
use crate::models::{CartLine, ProductSummary};
use crate::store::CartStore;

const CART_SELECT: &str = r"
    SELECT c.id, c.quantity, p.id AS product_id, p.title, p.price, p.thumbnail_url
    FROM storefront.cart_item c
    JOIN storefront.product p ON p.id = c.product_id
";

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartLineId,
    quantity: i32,
    product_id: ProductId,
    title: String,
    price: Decimal,
    thumbnail_url: Option<String>,
}

impl TryFrom<CartRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            quantity: quantity_from_db(row.quantity)?,
            product: ProductSummary {
                id: row.product_id,
                title: row.title,
                price: row.price,
                thumbnail_url: row.thumbnail_url,
            },
        })
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn list_cart(&self, user: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows: Vec<CartRow> =
            sqlx::query_as(&format!("{CART_SELECT} WHERE c.user_id = $1 ORDER BY c.created_at"))
                .bind(user)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(CartLine::try_from).collect()
    }

    async fn find_cart_line(
        &self,
        user: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let row: Option<CartRow> = sqlx::query_as(&format!(
            "{CART_SELECT} WHERE c.user_id = $1 AND c.product_id = $2"
        ))
        .bind(user)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CartLine::try_from).transpose()
    }

    async fn insert_cart_line(
        &self,
        user: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLineId, RepositoryError> {
        // Two tabs adding the same product race here; the unique key folds
        // the second insert into an increment.
        let id: CartLineId = sqlx::query_scalar(
            r"
            INSERT INTO storefront.cart_item (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = storefront.cart_item.quantity + EXCLUDED.quantity
            RETURNING id
            ",
        )
        .bind(user)
        .bind(product_id)
        .bind(quantity_to_db(quantity)?)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn set_cart_quantity(
        &self,
        user: UserId,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE storefront.cart_item SET quantity = $3 WHERE id = $1 AND user_id = $2",
        )
        .bind(line_id)
        .bind(user)
        .bind(quantity_to_db(quantity)?)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_cart_line(
        &self,
        user: UserId,
        line_id: CartLineId,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM storefront.cart_item WHERE id = $1 AND user_id = $2")
                .bind(line_id)
                .bind(user)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn clear_cart(&self, user: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1")
            .bind(user)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
