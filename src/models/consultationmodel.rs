use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Consultation {
    pub id: String,
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub message: String,
    pub property_id: Option<String>,
    pub project_id: Option<String>,
    // Workflow status lives on the backend; rows start out "pending"
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
