use super::AddressStore;
use crate::error::StoreResult;
use crate::models::{AddressUpdate, NewAddress, UserAddress};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

const ADDRESS_COLUMNS: &str = "id, user_id, zip_code, country, province, city, detail, \
     first_name, last_name, contact_phone, default_mark_time, created_at, updated_at, deleted_at";

#[derive(Clone)]
pub struct PgAddressStore {
    pool: PgPool,
}

impl PgAddressStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AddressStore for PgAddressStore {
    async fn list_by_user(&self, user_id: i64) -> StoreResult<Vec<UserAddress>> {
        let rows = sqlx::query_as::<_, UserAddress>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM user_addresses \
             WHERE user_id = $1 AND deleted_at IS NULL ORDER BY id ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn get_default(&self, user_id: i64) -> StoreResult<Option<UserAddress>> {
        let row = sqlx::query_as::<_, UserAddress>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM user_addresses \
             WHERE user_id = $1 AND deleted_at IS NULL \
             ORDER BY default_mark_time DESC, id ASC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn create(&self, address: &NewAddress) -> StoreResult<i64> {
        let fields = &address.fields;
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO user_addresses (
                user_id, zip_code, country, province, city, detail,
                first_name, last_name, contact_phone, default_mark_time,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING id
            "#,
        )
        .bind(address.user_id)
        .bind(&fields.zip_code)
        .bind(&fields.country)
        .bind(&fields.province)
        .bind(&fields.city)
        .bind(&fields.detail)
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(&fields.contact_phone)
        .bind(address.default_mark_time)
        .bind(address.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update(&self, update: &AddressUpdate) -> StoreResult<u64> {
        let fields = &update.fields;
        let result = sqlx::query(
            r#"
            UPDATE user_addresses
            SET zip_code = $3,
                country = $4,
                province = $5,
                city = $6,
                detail = $7,
                first_name = $8,
                last_name = $9,
                contact_phone = $10,
                default_mark_time = COALESCE($11, default_mark_time),
                updated_at = $12
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(update.id)
        .bind(update.user_id)
        .bind(&fields.zip_code)
        .bind(&fields.country)
        .bind(&fields.province)
        .bind(&fields.city)
        .bind(&fields.detail)
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(&fields.contact_phone)
        .bind(update.default_mark_time)
        .bind(update.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn soft_delete(&self, id: i64, user_id: i64, at: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE user_addresses
            SET deleted_at = $3, updated_at = $3
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
