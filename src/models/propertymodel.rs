use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Available,
    Sold,
    Rented,
}

impl PropertyStatus {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "sold" => PropertyStatus::Sold,
            "rented" => PropertyStatus::Rented,
            _ => PropertyStatus::Available,
        }
    }

    pub fn to_str(&self) -> &str {
        match self {
            PropertyStatus::Available => "available",
            PropertyStatus::Sold => "sold",
            PropertyStatus::Rented => "rented",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Sale,
    Rent,
}

impl TransactionType {
    /// `None` for anything outside the known vocabulary so filters can
    /// tell "unset" apart from "sale".
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sale" => Some(TransactionType::Sale),
            "rent" => Some(TransactionType::Rent),
            _ => None,
        }
    }

    pub fn to_str(&self) -> &str {
        match self {
            TransactionType::Sale => "sale",
            TransactionType::Rent => "rent",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Property {
    pub id: String,

    // Basic listing info
    pub title: String,
    pub description: String,
    pub property_type: String,
    pub transaction_type: Option<TransactionType>,

    // Pricing
    pub price: i64,
    pub currency: String,

    // Specifications
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area: f64,
    pub direction: String,
    pub legal_status: String,

    // Location details
    pub address: String,
    pub district: String,
    pub city: String,
    pub province: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    // Media and features
    pub images: Vec<String>,
    pub features: Vec<String>,

    pub status: PropertyStatus,
    pub is_featured: bool,
    pub is_urgent: bool,
    pub views: u64,

    pub owner_id: String,
    pub agent_id: String,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
