use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum NewsStatus {
    Draft,
    Published,
    Archived,
}

impl NewsStatus {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "draft" => NewsStatus::Draft,
            "archived" => NewsStatus::Archived,
            _ => NewsStatus::Published,
        }
    }

    pub fn to_str(&self) -> &str {
        match self {
            NewsStatus::Draft => "draft",
            NewsStatus::Published => "published",
            NewsStatus::Archived => "archived",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub featured_image: String,
    pub category: String,
    pub tags: Vec<String>,
    pub author: String,
    pub status: NewsStatus,
    pub views: u64,

    pub published_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
