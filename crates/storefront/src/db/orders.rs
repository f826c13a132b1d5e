//! Order queries.
//!
//! `place_order` writes the header and all lines in one transaction, so a
//! failure never leaves a header without lines.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use kirana_core::{AddressId, OrderId, OrderLineId, OrderStatus, ProductId, UserId};

use super::{PgStore, RepositoryError, quantity_from_db, quantity_to_db};
use crate::models::{NewOrder, NewOrderLine, Order, OrderLine};
use crate::store::OrderStore;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    address_id: AddressId,
    status: String,
    total_amount: Decimal,
    currency: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row
            .status
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("order {}: {e}", row.id)))?;
        let currency = row
            .currency
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("order {}: {e}", row.id)))?;

        Ok(Self {
            id: row.id,
            address_id: row.address_id,
            status,
            total_amount: row.total_amount,
            currency,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderLineRow {
    id: OrderLineId,
    order_id: OrderId,
    product_id: ProductId,
    product_title: String,
    unit_price: Decimal,
    quantity: i32,
}

impl TryFrom<OrderLineRow> for OrderLine {
    type Error = RepositoryError;

    fn try_from(row: OrderLineRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_title: row.product_title,
            unit_price: row.unit_price,
            quantity: quantity_from_db(row.quantity)?,
        })
    }
}

async fn insert_header<'e, E>(
    executor: E,
    user: UserId,
    order: &NewOrder,
) -> Result<OrderId, RepositoryError>
where
    E: sqlx::PgExecutor<'e>,
{
    let id: OrderId = sqlx::query_scalar(
        r"
        INSERT INTO storefront.customer_order
            (user_id, address_id, status, total_amount, currency)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        ",
    )
    .bind(user)
    .bind(order.address_id)
    .bind(order.status.as_str())
    .bind(order.total_amount)
    .bind(order.currency.code())
    .fetch_one(executor)
    .await?;

    Ok(id)
}

async fn insert_lines<'e, E>(
    executor: E,
    order_id: OrderId,
    lines: &[NewOrderLine],
) -> Result<(), RepositoryError>
where
    E: sqlx::PgExecutor<'e>,
{
    let mut product_ids: Vec<Uuid> = Vec::with_capacity(lines.len());
    let mut titles: Vec<String> = Vec::with_capacity(lines.len());
    let mut prices: Vec<Decimal> = Vec::with_capacity(lines.len());
    let mut quantities: Vec<i32> = Vec::with_capacity(lines.len());
    let mut positions: Vec<i32> = Vec::with_capacity(lines.len());

    for (position, line) in (1_i32..).zip(lines) {
        product_ids.push(line.product_id.as_uuid());
        titles.push(line.product_title.clone());
        prices.push(line.unit_price);
        quantities.push(quantity_to_db(line.quantity)?);
        positions.push(position);
    }

    sqlx::query(
        r"
        INSERT INTO storefront.order_item
            (order_id, product_id, product_title, unit_price, quantity, line_no)
        SELECT $1, u.product_id, u.product_title, u.unit_price, u.quantity, u.line_no
        FROM UNNEST($2::uuid[], $3::text[], $4::numeric[], $5::int4[], $6::int4[])
            AS u(product_id, product_title, unit_price, quantity, line_no)
        ",
    )
    .bind(order_id)
    .bind(&product_ids)
    .bind(&titles)
    .bind(&prices)
    .bind(&quantities)
    .bind(&positions)
    .execute(executor)
    .await?;

    Ok(())
}

#[async_trait]
impl OrderStore for PgStore {
    async fn create_order(
        &self,
        user: UserId,
        order: &NewOrder,
    ) -> Result<OrderId, RepositoryError> {
        insert_header(&self.pool, user, order).await
    }

    async fn create_order_lines(
        &self,
        order_id: OrderId,
        lines: &[NewOrderLine],
    ) -> Result<(), RepositoryError> {
        insert_lines(&self.pool, order_id, lines).await
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.customer_order WHERE id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn place_order(
        &self,
        user: UserId,
        order: &NewOrder,
        lines: &[NewOrderLine],
    ) -> Result<OrderId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order_id = insert_header(&mut *tx, user, order).await?;
        insert_lines(&mut *tx, order_id, lines).await?;

        tx.commit().await?;
        Ok(order_id)
    }

    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            r"
            SELECT id, address_id, status, total_amount, currency, created_at
            FROM storefront.customer_order
            WHERE user_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn get_order(
        &self,
        user: UserId,
        order_id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(
            r"
            SELECT id, address_id, status, total_amount, currency, created_at
            FROM storefront.customer_order
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(order_id)
        .bind(user)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn list_order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let rows: Vec<OrderLineRow> = sqlx::query_as(
            r"
            SELECT id, order_id, product_id, product_title, unit_price, quantity
            FROM storefront.order_item
            WHERE order_id = $1
            ORDER BY line_no
            ",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OrderLine::try_from).collect()
    }
}
