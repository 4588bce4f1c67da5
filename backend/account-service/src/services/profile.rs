/// User profile reads and updates
use crate::db::{AddressStore, Database, UserStore};
use crate::error::{AccountError, Result};
use crate::models::{AddressView, UserProfile, UserUpdate};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

pub struct ProfileService<D: Database> {
    users: Arc<dyn UserStore<D::Tx>>,
    addresses: Arc<dyn AddressStore>,
}

impl<D: Database> ProfileService<D> {
    pub fn new(users: Arc<dyn UserStore<D::Tx>>, addresses: Arc<dyn AddressStore>) -> Self {
        Self { users, addresses }
    }

    /// `None` when the user does not exist
    pub async fn get_profile(&self, user_id: i64) -> Result<Option<UserProfile>> {
        let Some(user) = self
            .users
            .get_by_id(user_id)
            .await
            .map_err(AccountError::upstream("look up user"))?
        else {
            return Ok(None);
        };

        let default_address = self
            .addresses
            .get_default(user_id)
            .await
            .map_err(AccountError::upstream("look up default address"))?
            .map(|row| {
                let is_default = row.default_mark_time > 0;
                AddressView::from_row(row, is_default)
            });

        Ok(Some(UserProfile::from_user(&user, default_address)))
    }

    pub async fn update_profile(&self, user_id: i64, name: &str, avatar: &str) -> Result<()> {
        let update = UserUpdate::profile(user_id, name.to_string(), avatar.to_string(), Utc::now());

        let updated = self
            .users
            .update(&update)
            .await
            .map_err(AccountError::upstream("update profile"))?;
        if updated == 0 {
            return Err(AccountError::NotFound(format!("user {user_id}")));
        }

        info!(user_id, "Profile updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryBackend, MemoryTx};
    use crate::models::{AddressInput, NewAddress, NewUser};

    fn service(db: &MemoryBackend) -> ProfileService<MemoryBackend> {
        let users: Arc<dyn UserStore<MemoryTx>> = Arc::new(db.clone());
        ProfileService::<MemoryBackend>::new(users, Arc::new(db.clone()))
    }

    async fn seed_user(db: &MemoryBackend) -> i64 {
        UserStore::create(db, &NewUser::inactive("a@x.com", "hash".to_string(), Utc::now()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_user_has_no_profile() {
        let db = MemoryBackend::new();
        assert!(service(&db).get_profile(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_then_get() {
        let db = MemoryBackend::new();
        let id = seed_user(&db).await;
        let service = service(&db);

        service.update_profile(id, "Ada", "avatar-1").await.unwrap();
        let profile = service.get_profile(id).await.unwrap().unwrap();

        assert_eq!(profile.email, "a@x.com");
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.avatar, "avatar-1");
        assert!(profile.default_address.is_none());
    }

    #[tokio::test]
    async fn test_update_unknown_user_is_not_found() {
        let db = MemoryBackend::new();
        let err = service(&db).update_profile(99, "Ada", "a").await.unwrap_err();
        assert!(matches!(err, AccountError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_profile_includes_default_address() {
        let db = MemoryBackend::new();
        let id = seed_user(&db).await;
        let fields = AddressInput {
            zip_code: "018956".to_string(),
            country: "Singapore".to_string(),
            detail: "10 Bayfront Ave".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            contact_phone: "+6591234567".to_string(),
            ..Default::default()
        };
        AddressStore::create(
            &db,
            &NewAddress {
                user_id: id,
                fields,
                default_mark_time: 1_700_000_000,
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap();

        let profile = service(&db).get_profile(id).await.unwrap().unwrap();
        let address = profile.default_address.unwrap();
        assert!(address.is_default);
        assert_eq!(address.zip_code, "018956");
    }
}
