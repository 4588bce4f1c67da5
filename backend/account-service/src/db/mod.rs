//! Persistence contracts for account-service
//!
//! The services depend only on the traits in this module. The `Pg*` types
//! implement them over sqlx; `memory` (tests and the `test-util` feature)
//! implements them in-process with the same uniqueness and transaction
//! semantics.

pub mod activations;
pub mod addresses;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod transaction;
pub mod users;

use crate::error::StoreResult;
use crate::models::{
    ActivationRecord, AddressUpdate, NewActivation, NewAddress, NewUser, User, UserAddress,
    UserUpdate,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use activations::PgActivationStore;
pub use addresses::PgAddressStore;
#[cfg(any(test, feature = "test-util"))]
pub use memory::{MemoryBackend, MemoryOp, MemoryTx};
pub use transaction::{PgDatabase, PgTx};
pub use users::PgUserStore;

/// Unique constraint on `users.email`
pub const USERS_EMAIL_KEY: &str = "users_email_key";

/// Unique constraint on `user_activations.code`
pub const USER_ACTIVATIONS_CODE_KEY: &str = "user_activations_code_key";

/// Transaction boundary.
///
/// `commit` persists everything written through the handle; `rollback`, or
/// dropping the handle without committing, discards it.
#[async_trait]
pub trait Database: Send + Sync {
    type Tx: Send;

    async fn begin(&self) -> StoreResult<Self::Tx>;

    async fn commit(&self, tx: Self::Tx) -> StoreResult<()>;

    async fn rollback(&self, tx: Self::Tx) -> StoreResult<()>;
}

/// User identity rows
#[async_trait]
pub trait UserStore<Tx: Send>: Send + Sync {
    /// Insert an inactive user, returning the assigned id.
    /// Fails with `StoreError::DuplicateKey` when the email is taken.
    async fn create(&self, user: &NewUser) -> StoreResult<i64>;

    async fn get_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn get_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    /// Returns the number of rows written (0 or 1)
    async fn update(&self, update: &UserUpdate) -> StoreResult<u64>;

    /// Same as `update`, against an open transaction
    async fn update_in_transaction(&self, update: &UserUpdate, tx: &mut Tx) -> StoreResult<u64>;
}

/// Outstanding activation codes, at most one per user
#[async_trait]
pub trait ActivationStore<Tx: Send>: Send + Sync {
    /// Upsert keyed by user id: any previous code of that user is superseded.
    /// Fails with `StoreError::DuplicateKey` when another user holds the code.
    async fn replace(&self, activation: &NewActivation) -> StoreResult<ActivationRecord>;

    async fn get_by_code(&self, code: &str) -> StoreResult<Option<ActivationRecord>>;

    /// Delete the user's record provided it still carries `code`.
    /// Returns the number of rows deleted; 0 once the code was consumed or
    /// superseded by a newer one.
    async fn delete_by_user_id(&self, user_id: i64, code: &str, tx: &mut Tx)
        -> StoreResult<u64>;
}

/// Shipping addresses; soft-deleted rows are never returned
#[async_trait]
pub trait AddressStore: Send + Sync {
    async fn list_by_user(&self, user_id: i64) -> StoreResult<Vec<UserAddress>>;

    /// Most recently marked default, ties broken by lowest id
    async fn get_default(&self, user_id: i64) -> StoreResult<Option<UserAddress>>;

    async fn create(&self, address: &NewAddress) -> StoreResult<i64>;

    async fn update(&self, update: &AddressUpdate) -> StoreResult<u64>;

    async fn soft_delete(&self, id: i64, user_id: i64, at: DateTime<Utc>) -> StoreResult<u64>;
}
