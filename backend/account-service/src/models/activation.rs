use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Number of digits in an activation code
pub const ACTIVATION_CODE_LENGTH: usize = 6;

/// Default lifetime of an activation code (5 minutes)
pub const DEFAULT_ACTIVATION_TTL_SECS: i64 = 300;

/// Outstanding single-use activation code for a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ActivationRecord {
    pub id: i64,
    pub user_id: i64,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ActivationRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Replacement record for a user's outstanding activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivation {
    pub user_id: i64,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl NewActivation {
    pub fn issue(user_id: i64, code: String, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            user_id,
            code,
            created_at: now,
            expires_at: now + ttl,
        }
    }
}

/// Shape check for a submitted code: exactly six ASCII digits
pub fn is_well_formed_code(code: &str) -> bool {
    code.len() == ACTIVATION_CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}
