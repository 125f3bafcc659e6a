//! Address repository for database operations

use honey_common::error::DatabaseResult;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Address, AddressInput};

const ADDRESS_COLUMNS: &str = "id, profile_id, type, line1, line2, city, state, country, \
                               postal_code, created_at, updated_at";

/// Address repository
#[derive(Clone)]
pub struct AddressRepository {
    pool: PgPool,
}

impl AddressRepository {
    /// Create a new address repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All addresses owned by a profile, oldest first
    pub async fn list_by_profile(&self, profile_id: Uuid) -> DatabaseResult<Vec<Address>> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE profile_id = $1 ORDER BY created_at"
        );

        let addresses = sqlx::query_as::<_, Address>(&sql)
            .bind(profile_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(addresses)
    }

    /// Add an address to a profile
    pub async fn create(&self, profile_id: Uuid, input: &AddressInput) -> DatabaseResult<Address> {
        let sql = format!(
            r#"
            INSERT INTO addresses
                (profile_id, type, line1, line2, city, state, country, postal_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ADDRESS_COLUMNS}
            "#
        );

        let address = sqlx::query_as::<_, Address>(&sql)
            .bind(profile_id)
            .bind(input.address_type.map(|t| t.as_str()))
            .bind(&input.line1)
            .bind(&input.line2)
            .bind(&input.city)
            .bind(&input.state)
            .bind(&input.country)
            .bind(&input.postal_code)
            .fetch_one(&self.pool)
            .await?;

        Ok(address)
    }

    /// Update the given fields of an address the profile owns
    ///
    /// Returns None when no address with that ID belongs to the profile.
    pub async fn update(
        &self,
        id: Uuid,
        profile_id: Uuid,
        input: &AddressInput,
    ) -> DatabaseResult<Option<Address>> {
        let sql = format!(
            r#"
            UPDATE addresses
            SET type = COALESCE($3, type),
                line1 = COALESCE($4, line1),
                line2 = COALESCE($5, line2),
                city = COALESCE($6, city),
                state = COALESCE($7, state),
                country = COALESCE($8, country),
                postal_code = COALESCE($9, postal_code),
                updated_at = NOW()
            WHERE id = $1 AND profile_id = $2
            RETURNING {ADDRESS_COLUMNS}
            "#
        );

        let address = sqlx::query_as::<_, Address>(&sql)
            .bind(id)
            .bind(profile_id)
            .bind(input.address_type.map(|t| t.as_str()))
            .bind(&input.line1)
            .bind(&input.line2)
            .bind(&input.city)
            .bind(&input.state)
            .bind(&input.country)
            .bind(&input.postal_code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(address)
    }

    /// Delete an address the profile owns; returns the number of rows removed
    pub async fn delete(&self, id: Uuid, profile_id: Uuid) -> DatabaseResult<u64> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND profile_id = $2")
            .bind(id)
            .bind(profile_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
