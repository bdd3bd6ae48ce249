use chrono::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Customer,
    Agent,
    Developer,
}

impl UserType {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "agent" => UserType::Agent,
            "developer" => UserType::Developer,
            _ => UserType::Customer,
        }
    }

    pub fn to_str(&self) -> &str {
        match self {
            UserType::Customer => "customer",
            UserType::Agent => "agent",
            UserType::Developer => "developer",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub avatar_url: String,
    pub user_type: UserType,

    pub is_vip: bool,
    pub vip_expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,

    pub address: String,
    pub city: String,
    pub district: String,

    // Derived counts, 0 when the gateway row omits them
    pub total_favorites: u32,
    pub total_saved_filters: u32,
    pub total_consultations: u32,

    pub last_login: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
