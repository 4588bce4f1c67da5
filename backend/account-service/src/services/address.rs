/// Shipping address management
use crate::db::AddressStore;
use crate::error::{AccountError, Result};
use crate::models::{AddressInput, AddressUpdate, AddressView, NewAddress, UserAddress};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

pub struct AddressService {
    addresses: Arc<dyn AddressStore>,
}

/// Id of the most recently marked default, lowest id on ties; none if never marked
fn default_address_id(rows: &[UserAddress]) -> Option<i64> {
    rows.iter()
        .filter(|a| a.default_mark_time > 0)
        .max_by(|a, b| {
            a.default_mark_time
                .cmp(&b.default_mark_time)
                .then_with(|| b.id.cmp(&a.id))
        })
        .map(|a| a.id)
}

impl AddressService {
    pub fn new(addresses: Arc<dyn AddressStore>) -> Self {
        Self { addresses }
    }

    /// Live addresses, default first, then by ascending id
    pub async fn list(&self, user_id: i64) -> Result<Vec<AddressView>> {
        let mut rows = self
            .addresses
            .list_by_user(user_id)
            .await
            .map_err(AccountError::upstream("list addresses"))?;

        let default_id = default_address_id(&rows);
        rows.sort_by_key(|a| (Some(a.id) != default_id, a.id));

        Ok(rows
            .into_iter()
            .map(|row| {
                let is_default = Some(row.id) == default_id;
                AddressView::from_row(row, is_default)
            })
            .collect())
    }

    pub async fn get_default(&self, user_id: i64) -> Result<Option<AddressView>> {
        let row = self
            .addresses
            .get_default(user_id)
            .await
            .map_err(AccountError::upstream("look up default address"))?;

        Ok(row.map(|row| {
            let is_default = row.default_mark_time > 0;
            AddressView::from_row(row, is_default)
        }))
    }

    pub async fn create(&self, user_id: i64, input: AddressInput) -> Result<AddressView> {
        input.validate()?;

        let now = Utc::now();
        let address = NewAddress {
            user_id,
            default_mark_time: if input.is_default { now.timestamp() } else { 0 },
            fields: input,
            created_at: now,
        };

        let id = self
            .addresses
            .create(&address)
            .await
            .map_err(AccountError::upstream("create address"))?;

        info!(user_id, address_id = id, "Address created");
        let fields = address.fields;
        Ok(AddressView {
            id,
            user_id,
            zip_code: fields.zip_code,
            country: fields.country,
            province: fields.province,
            city: fields.city,
            detail: fields.detail,
            first_name: fields.first_name,
            last_name: fields.last_name,
            contact_phone: fields.contact_phone,
            is_default: fields.is_default,
        })
    }

    /// Rewrite an address owned by `user_id`; marking it default makes it the
    /// most recent default.
    pub async fn update(&self, address_id: i64, user_id: i64, input: AddressInput) -> Result<()> {
        input.validate()?;

        let now = Utc::now();
        let update = AddressUpdate {
            id: address_id,
            user_id,
            default_mark_time: input.is_default.then(|| now.timestamp()),
            fields: input,
            updated_at: now,
        };

        let updated = self
            .addresses
            .update(&update)
            .await
            .map_err(AccountError::upstream("update address"))?;
        if updated == 0 {
            return Err(AccountError::NotFound(format!("address {address_id}")));
        }

        info!(user_id, address_id, "Address updated");
        Ok(())
    }

    pub async fn delete(&self, address_id: i64, user_id: i64) -> Result<()> {
        let deleted = self
            .addresses
            .soft_delete(address_id, user_id, Utc::now())
            .await
            .map_err(AccountError::upstream("delete address"))?;
        if deleted == 0 {
            return Err(AccountError::NotFound(format!("address {address_id}")));
        }

        info!(user_id, address_id, "Address deleted");
        Ok(())
    }
}
