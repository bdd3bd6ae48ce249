use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Upcoming,
    Selling,
    Completed,
}

impl ProjectStatus {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "selling" => ProjectStatus::Selling,
            "completed" => ProjectStatus::Completed,
            _ => ProjectStatus::Upcoming,
        }
    }

    pub fn to_str(&self) -> &str {
        match self {
            ProjectStatus::Upcoming => "upcoming",
            ProjectStatus::Selling => "selling",
            ProjectStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    pub developer: String,

    // Location details
    pub address: String,
    pub district: String,
    pub city: String,
    pub province: String,

    // Scale and pricing
    pub area: f64,
    pub total_units: u32,
    pub price_from: i64,
    pub price_to: i64,

    // Media and features
    pub images: Vec<String>,
    pub features: Vec<String>,
    pub amenities: Vec<String>,

    pub status: ProjectStatus,
    pub is_featured: bool,
    pub views: u64,

    pub launch_date: Option<DateTime<Utc>>,
    pub completion_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
