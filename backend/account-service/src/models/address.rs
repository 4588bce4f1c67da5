use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Shipping address row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserAddress {
    pub id: i64,
    pub user_id: i64,
    pub zip_code: String,
    pub country: String,
    pub province: String,
    pub city: String,
    pub detail: String,
    pub first_name: String,
    pub last_name: String,
    pub contact_phone: String,
    /// Unix seconds of the last time this address was marked default, 0 if never
    pub default_mark_time: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Address fields supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AddressInput {
    #[validate(length(min = 1, max = 16))]
    pub zip_code: String,
    #[validate(length(min = 1, max = 64))]
    pub country: String,
    #[validate(length(max = 64))]
    pub province: String,
    #[validate(length(max = 64))]
    pub city: String,
    #[validate(length(min = 1, max = 255))]
    pub detail: String,
    #[validate(length(min = 1, max = 64))]
    pub first_name: String,
    #[validate(length(min = 1, max = 64))]
    pub last_name: String,
    #[validate(custom(function = "crate::validators::validate_contact_phone"))]
    pub contact_phone: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Address as presented to callers, with the resolved default flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressView {
    pub id: i64,
    pub user_id: i64,
    pub zip_code: String,
    pub country: String,
    pub province: String,
    pub city: String,
    pub detail: String,
    pub first_name: String,
    pub last_name: String,
    pub contact_phone: String,
    pub is_default: bool,
}

impl AddressView {
    pub fn from_row(row: UserAddress, is_default: bool) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            zip_code: row.zip_code,
            country: row.country,
            province: row.province,
            city: row.city,
            detail: row.detail,
            first_name: row.first_name,
            last_name: row.last_name,
            contact_phone: row.contact_phone,
            is_default,
        }
    }
}

/// Row to insert for a new address
#[derive(Debug, Clone)]
pub struct NewAddress {
    pub user_id: i64,
    pub fields: AddressInput,
    pub default_mark_time: i64,
    pub created_at: DateTime<Utc>,
}

/// Full rewrite of an address scoped by `(id, user_id)`.
/// `default_mark_time` is only refreshed when set.
#[derive(Debug, Clone)]
pub struct AddressUpdate {
    pub id: i64,
    pub user_id: i64,
    pub fields: AddressInput,
    pub default_mark_time: Option<i64>,
    pub updated_at: DateTime<Utc>,
}
