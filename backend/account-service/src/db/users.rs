//! User database operations for account-service

use super::{PgTx, UserStore};
use crate::error::StoreResult;
use crate::models::{NewUser, User, UserStatus, UserUpdate};
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::{error, info};

const USER_COLUMNS: &str =
    "id, email, password_hash, status, name, avatar_id, activated_at, created_at, updated_at";

const UPDATE_USER_SQL: &str = r#"
    UPDATE users
    SET
        status = COALESCE($2, status),
        name = COALESCE($3, name),
        avatar_id = COALESCE($4, avatar_id),
        activated_at = COALESCE($5, activated_at),
        updated_at = $6
    WHERE id = $1
      AND ($7::SMALLINT IS NULL OR status = $7)
"#;

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn apply_update(conn: &mut PgConnection, update: &UserUpdate) -> StoreResult<u64> {
    let result = sqlx::query(UPDATE_USER_SQL)
        .bind(update.id)
        .bind(update.status)
        .bind(update.name.as_deref())
        .bind(update.avatar_id.as_deref())
        .bind(update.activated_at)
        .bind(update.updated_at)
        .bind(update.require_status)
        .execute(conn)
        .await
        .map_err(|e| {
            error!(user_id = update.id, error = %e, "Failed to update user");
            e
        })?;

    Ok(result.rows_affected())
}

#[async_trait]
impl UserStore<PgTx> for PgUserStore {
    async fn create(&self, user: &NewUser) -> StoreResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (email, password_hash, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(UserStatus::Inactive)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await?;

        info!(user_id = id, "User created");
        Ok(id)
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    async fn update(&self, update: &UserUpdate) -> StoreResult<u64> {
        let mut conn = self.pool.acquire().await?;
        apply_update(&mut conn, update).await
    }

    async fn update_in_transaction(&self, update: &UserUpdate, tx: &mut PgTx) -> StoreResult<u64> {
        apply_update(tx, update).await
    }
}
