use super::Database;
use crate::error::StoreResult;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

/// Open PostgreSQL transaction; rolled back by sqlx when dropped uncommitted
pub type PgTx = Transaction<'static, Postgres>;

/// Transaction boundary over a PostgreSQL pool
#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Database for PgDatabase {
    type Tx = PgTx;

    async fn begin(&self) -> StoreResult<PgTx> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, tx: PgTx) -> StoreResult<()> {
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self, tx: PgTx) -> StoreResult<()> {
        tx.rollback().await?;
        Ok(())
    }
}
