//! Activation code storage
//!
//! One row per user. Issuing a new code overwrites the previous one in place,
//! so at most one code per user is ever redeemable.

use super::{ActivationStore, PgTx};
use crate::error::StoreResult;
use crate::models::{ActivationRecord, NewActivation};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

#[derive(Clone)]
pub struct PgActivationStore {
    pool: PgPool,
}

impl PgActivationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivationStore<PgTx> for PgActivationStore {
    async fn replace(&self, activation: &NewActivation) -> StoreResult<ActivationRecord> {
        let record = sqlx::query_as::<_, ActivationRecord>(
            r#"
            INSERT INTO user_activations (user_id, code, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET code = EXCLUDED.code,
                created_at = EXCLUDED.created_at,
                expires_at = EXCLUDED.expires_at
            RETURNING id, user_id, code, created_at, expires_at
            "#,
        )
        .bind(activation.user_id)
        .bind(&activation.code)
        .bind(activation.created_at)
        .bind(activation.expires_at)
        .fetch_one(&self.pool)
        .await?;

        debug!(user_id = record.user_id, "Activation code replaced");
        Ok(record)
    }

    async fn get_by_code(&self, code: &str) -> StoreResult<Option<ActivationRecord>> {
        let record = sqlx::query_as::<_, ActivationRecord>(
            r#"
            SELECT id, user_id, code, created_at, expires_at
            FROM user_activations
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn delete_by_user_id(
        &self,
        user_id: i64,
        code: &str,
        tx: &mut PgTx,
    ) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM user_activations WHERE user_id = $1 AND code = $2")
            .bind(user_id)
            .bind(code)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected())
    }
}
