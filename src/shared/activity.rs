//! Activity Log Entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Something a user did that others may see in their feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "ssr", derive(sqlx::FromRow))]
pub struct ActivityEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    #[cfg_attr(feature = "ssr", sqlx(json))]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
