use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

use super::address::AddressView;

/// Lifecycle status stored as SMALLINT (-1 inactive, 1 active)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[repr(i16)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Inactive = -1,
    Active = 1,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Inactive => "inactive",
            UserStatus::Active => "active",
        }
    }
}

/// User model - core identity row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub status: UserStatus,
    pub name: Option<String>,
    pub avatar_id: Option<String>,
    pub activated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Active iff the activation timestamp is set
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active && self.activated_at.is_some()
    }
}

/// Row to insert for a provisional (inactive) user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    pub fn inactive(email: &str, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            email: email.to_string(),
            password_hash,
            created_at: now,
        }
    }
}

/// Partial update of a user row. `None` fields are left untouched.
///
/// `require_status` turns the update into a compare-and-set: the row is only
/// written when its current status matches, and the affected-row count tells
/// the caller whether it won.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub id: i64,
    pub status: Option<UserStatus>,
    pub name: Option<String>,
    pub avatar_id: Option<String>,
    pub activated_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub require_status: Option<UserStatus>,
}

impl UserUpdate {
    /// Inactive -> Active transition stamped with `at`
    pub fn activate(id: i64, at: DateTime<Utc>) -> Self {
        Self {
            id,
            status: Some(UserStatus::Active),
            activated_at: Some(at),
            updated_at: at,
            require_status: Some(UserStatus::Inactive),
            ..Default::default()
        }
    }

    pub fn profile(id: i64, name: String, avatar_id: String, at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: Some(name),
            avatar_id: Some(avatar_id),
            updated_at: at,
            ..Default::default()
        }
    }
}

/// Public profile projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub avatar: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_address: Option<AddressView>,
}

impl UserProfile {
    pub fn from_user(user: &User, default_address: Option<AddressView>) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone().unwrap_or_default(),
            avatar: user.avatar_id.clone().unwrap_or_default(),
            default_address,
        }
    }
}
