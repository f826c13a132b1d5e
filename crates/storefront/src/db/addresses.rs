//! Address queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use kirana_core::{AddressId, UserId};

use super::{PgStore, RepositoryError};
use crate::models::{Address, NewAddress};
use crate::store::AddressStore;

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: AddressId,
    user_id: UserId,
    label: String,
    name: String,
    address_line: String,
    city: String,
    pincode: String,
    phone: String,
    created_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            label: row.label,
            name: row.name,
            address_line: row.address_line,
            city: row.city,
            pincode: row.pincode,
            phone: row.phone,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl AddressStore for PgStore {
    async fn list_addresses(&self, user: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows: Vec<AddressRow> = sqlx::query_as(
            r"
            SELECT id, user_id, label, name, address_line, city, pincode, phone, created_at
            FROM storefront.address
            WHERE user_id = $1
            ORDER BY created_at
            ",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    async fn create_address(
        &self,
        user: UserId,
        address: &NewAddress,
    ) -> Result<Address, RepositoryError> {
        let row: AddressRow = sqlx::query_as(
            r"
            INSERT INTO storefront.address
                (user_id, label, name, address_line, city, pincode, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, label, name, address_line, city, pincode, phone, created_at
            ",
        )
        .bind(user)
        .bind(&address.label)
        .bind(&address.name)
        .bind(&address.address_line)
        .bind(&address.city)
        .bind(&address.pincode)
        .bind(&address.phone)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }
}
