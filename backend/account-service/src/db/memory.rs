//! In-process store backend
//!
//! Implements every store trait plus [`Database`] over one mutex-guarded
//! state. A transaction holds the lock for its whole lifetime and restores
//! its snapshot unless committed, so commit/rollback/drop behave like the
//! Postgres backend. Individual operations can be made to fail on demand.

use super::{
    ActivationStore, AddressStore, Database, UserStore, USERS_EMAIL_KEY,
    USER_ACTIVATIONS_CODE_KEY,
};
use crate::error::{StoreError, StoreResult};
use crate::models::{
    ActivationRecord, AddressUpdate, NewActivation, NewAddress, NewUser, User, UserAddress,
    UserStatus, UserUpdate,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Store operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryOp {
    Begin,
    Commit,
    CreateUser,
    GetUserByEmail,
    GetUserById,
    UpdateUser,
    ReplaceActivation,
    GetActivationByCode,
    DeleteActivation,
    ListAddresses,
    GetDefaultAddress,
    CreateAddress,
    UpdateAddress,
    DeleteAddress,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: BTreeMap<i64, User>,
    /// Keyed by owning user id
    activations: BTreeMap<i64, ActivationRecord>,
    addresses: BTreeMap<i64, UserAddress>,
    last_user_id: i64,
    last_activation_id: i64,
    last_address_id: i64,
    writes: u64,
}

impl MemoryState {
    fn insert_user(&mut self, user: &NewUser) -> StoreResult<i64> {
        if self.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateKey {
                constraint: USERS_EMAIL_KEY.to_string(),
            });
        }

        self.last_user_id += 1;
        let id = self.last_user_id;
        self.users.insert(
            id,
            User {
                id,
                email: user.email.clone(),
                password_hash: user.password_hash.clone(),
                status: UserStatus::Inactive,
                name: None,
                avatar_id: None,
                activated_at: None,
                created_at: user.created_at,
                updated_at: user.created_at,
            },
        );
        self.writes += 1;
        Ok(id)
    }

    fn apply_user_update(&mut self, update: &UserUpdate) -> u64 {
        let Some(user) = self.users.get_mut(&update.id) else {
            return 0;
        };
        if update.require_status.is_some_and(|required| user.status != required) {
            return 0;
        }

        if let Some(status) = update.status {
            user.status = status;
        }
        if let Some(name) = &update.name {
            user.name = Some(name.clone());
        }
        if let Some(avatar_id) = &update.avatar_id {
            user.avatar_id = Some(avatar_id.clone());
        }
        if let Some(activated_at) = update.activated_at {
            user.activated_at = Some(activated_at);
        }
        user.updated_at = update.updated_at;
        self.writes += 1;
        1
    }

    fn replace_activation(&mut self, activation: &NewActivation) -> StoreResult<ActivationRecord> {
        let code_taken = self
            .activations
            .values()
            .any(|a| a.code == activation.code && a.user_id != activation.user_id);
        if code_taken {
            return Err(StoreError::DuplicateKey {
                constraint: USER_ACTIVATIONS_CODE_KEY.to_string(),
            });
        }

        // ON CONFLICT (user_id) keeps the row id
        let id = match self.activations.get(&activation.user_id) {
            Some(existing) => existing.id,
            None => {
                self.last_activation_id += 1;
                self.last_activation_id
            }
        };
        let record = ActivationRecord {
            id,
            user_id: activation.user_id,
            code: activation.code.clone(),
            created_at: activation.created_at,
            expires_at: activation.expires_at,
        };
        self.activations.insert(activation.user_id, record.clone());
        self.writes += 1;
        Ok(record)
    }

    fn delete_activation(&mut self, user_id: i64, code: &str) -> u64 {
        match self.activations.get(&user_id) {
            Some(record) if record.code == code => {
                self.activations.remove(&user_id);
                self.writes += 1;
                1
            }
            _ => 0,
        }
    }

    fn live_addresses(&self, user_id: i64) -> impl Iterator<Item = &UserAddress> {
        self.addresses
            .values()
            .filter(move |a| a.user_id == user_id && a.deleted_at.is_none())
    }

    fn live_address_mut(&mut self, id: i64, user_id: i64) -> Option<&mut UserAddress> {
        self.addresses
            .get_mut(&id)
            .filter(|a| a.user_id == user_id && a.deleted_at.is_none())
    }
}

/// Open transaction against a [`MemoryBackend`]
pub struct MemoryTx {
    state: OwnedMutexGuard<MemoryState>,
    snapshot: Option<MemoryState>,
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.state = snapshot;
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
    failures: Arc<StdMutex<HashSet<MemoryOp>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call of `op` fail with `StoreError::Unavailable`
    pub fn fail(&self, op: MemoryOp) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(op);
    }

    pub fn recover(&self, op: MemoryOp) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&op);
    }

    fn check(&self, op: MemoryOp) -> StoreResult<()> {
        let failing = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&op);
        if failing {
            return Err(StoreError::Unavailable(format!("injected failure on {op:?}")));
        }
        Ok(())
    }

    /// Number of committed row writes so far
    pub async fn write_count(&self) -> u64 {
        self.state.lock().await.writes
    }

    pub async fn user_count(&self) -> usize {
        self.state.lock().await.users.len()
    }

    pub async fn activation_for_user(&self, user_id: i64) -> Option<ActivationRecord> {
        self.state.lock().await.activations.get(&user_id).cloned()
    }

    /// Move the expiry of a user's outstanding code; false when there is none
    pub async fn set_activation_expiry(&self, user_id: i64, expires_at: DateTime<Utc>) -> bool {
        match self.state.lock().await.activations.get_mut(&user_id) {
            Some(record) => {
                record.expires_at = expires_at;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl Database for MemoryBackend {
    type Tx = MemoryTx;

    async fn begin(&self) -> StoreResult<MemoryTx> {
        self.check(MemoryOp::Begin)?;
        let state = self.state.clone().lock_owned().await;
        let snapshot = state.clone();
        Ok(MemoryTx {
            state,
            snapshot: Some(snapshot),
        })
    }

    async fn commit(&self, mut tx: MemoryTx) -> StoreResult<()> {
        self.check(MemoryOp::Commit)?;
        tx.snapshot = None;
        Ok(())
    }

    async fn rollback(&self, tx: MemoryTx) -> StoreResult<()> {
        drop(tx);
        Ok(())
    }
}

#[async_trait]
impl UserStore<MemoryTx> for MemoryBackend {
    async fn create(&self, user: &NewUser) -> StoreResult<i64> {
        self.check(MemoryOp::CreateUser)?;
        self.state.lock().await.insert_user(user)
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.check(MemoryOp::GetUserByEmail)?;
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        self.check(MemoryOp::GetUserById)?;
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn update(&self, update: &UserUpdate) -> StoreResult<u64> {
        self.check(MemoryOp::UpdateUser)?;
        Ok(self.state.lock().await.apply_user_update(update))
    }

    async fn update_in_transaction(&self, update: &UserUpdate, tx: &mut MemoryTx) -> StoreResult<u64> {
        self.check(MemoryOp::UpdateUser)?;
        Ok(tx.state.apply_user_update(update))
    }
}

#[async_trait]
impl ActivationStore<MemoryTx> for MemoryBackend {
    async fn replace(&self, activation: &NewActivation) -> StoreResult<ActivationRecord> {
        self.check(MemoryOp::ReplaceActivation)?;
        self.state.lock().await.replace_activation(activation)
    }

    async fn get_by_code(&self, code: &str) -> StoreResult<Option<ActivationRecord>> {
        self.check(MemoryOp::GetActivationByCode)?;
        let state = self.state.lock().await;
        Ok(state.activations.values().find(|a| a.code == code).cloned())
    }

    async fn delete_by_user_id(
        &self,
        user_id: i64,
        code: &str,
        tx: &mut MemoryTx,
    ) -> StoreResult<u64> {
        self.check(MemoryOp::DeleteActivation)?;
        Ok(tx.state.delete_activation(user_id, code))
    }
}

#[async_trait]
impl AddressStore for MemoryBackend {
    async fn list_by_user(&self, user_id: i64) -> StoreResult<Vec<UserAddress>> {
        self.check(MemoryOp::ListAddresses)?;
        let state = self.state.lock().await;
        Ok(state.live_addresses(user_id).cloned().collect())
    }

    async fn get_default(&self, user_id: i64) -> StoreResult<Option<UserAddress>> {
        self.check(MemoryOp::GetDefaultAddress)?;
        let state = self.state.lock().await;
        Ok(state
            .live_addresses(user_id)
            .min_by_key(|a| (Reverse(a.default_mark_time), a.id))
            .cloned())
    }

    async fn create(&self, address: &NewAddress) -> StoreResult<i64> {
        self.check(MemoryOp::CreateAddress)?;
        let mut state = self.state.lock().await;
        state.last_address_id += 1;
        let id = state.last_address_id;
        let fields = address.fields.clone();
        state.addresses.insert(
            id,
            UserAddress {
                id,
                user_id: address.user_id,
                zip_code: fields.zip_code,
                country: fields.country,
                province: fields.province,
                city: fields.city,
                detail: fields.detail,
                first_name: fields.first_name,
                last_name: fields.last_name,
                contact_phone: fields.contact_phone,
                default_mark_time: address.default_mark_time,
                created_at: address.created_at,
                updated_at: address.created_at,
                deleted_at: None,
            },
        );
        state.writes += 1;
        Ok(id)
    }

    async fn update(&self, update: &AddressUpdate) -> StoreResult<u64> {
        self.check(MemoryOp::UpdateAddress)?;
        let mut state = self.state.lock().await;
        let Some(row) = state.live_address_mut(update.id, update.user_id) else {
            return Ok(0);
        };

        let fields = update.fields.clone();
        row.zip_code = fields.zip_code;
        row.country = fields.country;
        row.province = fields.province;
        row.city = fields.city;
        row.detail = fields.detail;
        row.first_name = fields.first_name;
        row.last_name = fields.last_name;
        row.contact_phone = fields.contact_phone;
        if let Some(mark) = update.default_mark_time {
            row.default_mark_time = mark;
        }
        row.updated_at = update.updated_at;
        state.writes += 1;
        Ok(1)
    }

    async fn soft_delete(&self, id: i64, user_id: i64, at: DateTime<Utc>) -> StoreResult<u64> {
        self.check(MemoryOp::DeleteAddress)?;
        let mut state = self.state.lock().await;
        let Some(row) = state.live_address_mut(id, user_id) else {
            return Ok(0);
        };
        row.deleted_at = Some(at);
        row.updated_at = at;
        state.writes += 1;
        Ok(1)
    }
}
