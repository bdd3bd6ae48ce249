use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row per (user, property) pair.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Favorite {
    pub id: String,
    pub user_id: String,
    pub property_id: String,
    pub created_at: Option<DateTime<Utc>>,
}
