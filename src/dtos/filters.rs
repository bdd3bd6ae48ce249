use serde::{Deserialize, Serialize};

use crate::models::{ProjectStatus, TransactionType};

/// Listing query filters. Every field is optional; `None` means "do not
/// narrow on this".
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PropertyFilters {
    pub transaction_type: Option<TransactionType>,
    pub property_type: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub featured: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct NewsFilters {
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProjectFilters {
    pub status: Option<ProjectStatus>,
    pub developer: Option<String>,
    pub featured: Option<bool>,
    pub search: Option<String>,
    pub limit: Option<usize>,
}
