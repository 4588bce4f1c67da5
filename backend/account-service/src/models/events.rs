use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Published once per successful activation, keyed by user id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserActivatedEvent {
    pub user_id: i64,
    /// Unix seconds
    pub activate_time: i64,
}

impl UserActivatedEvent {
    pub fn new(user_id: i64, activated_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            activate_time: activated_at.timestamp(),
        }
    }

    /// Partition key so that all events of one user land on one partition
    pub fn partition_key(&self) -> String {
        self.user_id.to_string()
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
