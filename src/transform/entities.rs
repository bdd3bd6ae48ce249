use serde_json::Value;

use crate::models::{
    Favorite, NewsArticle, NewsStatus, Project, ProjectStatus, Property, PropertyStatus,
    TransactionType, User, UserType,
};

use super::fields::{
    avatar_url, date_field, field, int_field, num_field, opt_num_field, str_field, string_list,
    truthy,
};

/// Build a [`Property`] from a raw gateway row.
///
/// Total: malformed or missing fields fall back to defaults so one bad row
/// cannot poison a collection fetch.
pub fn property_from_row(row: &Value) -> Property {
    Property {
        id: str_field(row, &["id", "property_id"], ""),
        title: str_field(row, &["title", "property_title"], ""),
        description: str_field(row, &["description"], ""),
        property_type: str_field(row, &["property_type"], ""),
        transaction_type: TransactionType::from_str(&str_field(row, &["transaction_type"], "")),
        price: int_field(row, "price"),
        currency: str_field(row, &["currency"], "VND"),
        bedrooms: int_field(row, "bedrooms").max(0) as u32,
        bathrooms: int_field(row, "bathrooms").max(0) as u32,
        area: num_field(row, "area"),
        direction: str_field(row, &["direction"], ""),
        legal_status: str_field(row, &["legal_status"], ""),
        address: str_field(row, &["address"], ""),
        district: str_field(row, &["district"], ""),
        city: str_field(row, &["city"], ""),
        province: str_field(row, &["province"], ""),
        latitude: opt_num_field(row, "latitude"),
        longitude: opt_num_field(row, "longitude"),
        images: string_list(field(row, "images")),
        features: string_list(field(row, "features")),
        status: PropertyStatus::from_str(&str_field(row, &["status"], "available")),
        is_featured: truthy(field(row, "is_featured")),
        is_urgent: truthy(field(row, "is_urgent")),
        views: int_field(row, "views").max(0) as u64,
        owner_id: str_field(row, &["owner_id"], ""),
        agent_id: str_field(row, &["agent_id"], ""),
        created_at: date_field(row, &["created_at"]),
        updated_at: date_field(row, &["updated_at"]),
    }
}

/// Build a [`NewsArticle`] from a raw gateway row. The excerpt falls back
/// to the first 150 characters of the content.
pub fn news_from_row(row: &Value) -> NewsArticle {
    let content = str_field(row, &["content"], "");
    let excerpt = {
        let explicit = str_field(row, &["excerpt"], "");
        if !explicit.is_empty() {
            explicit
        } else if !content.is_empty() {
            let head: String = content.chars().take(150).collect();
            format!("{}...", head)
        } else {
            String::new()
        }
    };

    NewsArticle {
        id: str_field(row, &["id", "news_id"], ""),
        title: str_field(row, &["title"], ""),
        content,
        excerpt,
        featured_image: str_field(row, &["featured_image"], ""),
        category: str_field(row, &["category"], "general"),
        tags: string_list(field(row, "tags")),
        author: str_field(row, &["author"], "Admin"),
        status: NewsStatus::from_str(&str_field(row, &["status"], "published")),
        views: int_field(row, "views").max(0) as u64,
        published_at: date_field(row, &["published_at", "created_at"]),
        created_at: date_field(row, &["created_at"]),
        updated_at: date_field(row, &["updated_at"]),
    }
}

/// Build a [`Project`] from a raw gateway row.
pub fn project_from_row(row: &Value) -> Project {
    Project {
        id: str_field(row, &["id", "project_id"], ""),
        title: str_field(row, &["title", "project_name"], ""),
        description: str_field(row, &["description"], ""),
        developer: str_field(row, &["developer"], ""),
        address: str_field(row, &["address"], ""),
        district: str_field(row, &["district"], ""),
        city: str_field(row, &["city"], ""),
        province: str_field(row, &["province"], ""),
        area: num_field(row, "area"),
        total_units: int_field(row, "units").max(0) as u32,
        price_from: int_field(row, "price_from"),
        price_to: int_field(row, "price_to"),
        images: string_list(field(row, "images")),
        features: string_list(field(row, "features")),
        amenities: string_list(field(row, "amenities")),
        status: ProjectStatus::from_str(&str_field(row, &["status"], "upcoming")),
        is_featured: truthy(field(row, "is_featured")),
        views: int_field(row, "views").max(0) as u64,
        launch_date: date_field(row, &["launch_date"]),
        completion_date: date_field(row, &["completion_date"]),
        created_at: date_field(row, &["created_at"]),
        updated_at: date_field(row, &["updated_at"]),
    }
}

/// Build a [`User`] from a raw gateway row, unwrapping JSON-encoded avatar
/// fields and normalizing the VIP/active flags.
pub fn user_from_row(row: &Value) -> User {
    User {
        id: str_field(row, &["id", "user_id"], ""),
        email: str_field(row, &["email"], ""),
        full_name: str_field(row, &["full_name", "name"], ""),
        phone: str_field(row, &["phone"], ""),
        avatar_url: avatar_url(field(row, "avatar_url")),
        user_type: UserType::from_str(&str_field(row, &["user_type"], "customer")),
        is_vip: truthy(field(row, "is_vip")),
        vip_expires_at: date_field(row, &["vip_expires_at"]),
        is_active: truthy(field(row, "is_active")),
        address: str_field(row, &["address"], ""),
        city: str_field(row, &["city"], ""),
        district: str_field(row, &["district"], ""),
        total_favorites: int_field(row, "total_favorites").max(0) as u32,
        total_saved_filters: int_field(row, "total_saved_filters").max(0) as u32,
        total_consultations: int_field(row, "total_consultations").max(0) as u32,
        last_login: date_field(row, &["last_login"]),
        created_at: date_field(row, &["created_at"]),
        updated_at: date_field(row, &["updated_at"]),
    }
}

/// Build a [`Favorite`] join row.
pub fn favorite_from_row(row: &Value) -> Favorite {
    Favorite {
        id: str_field(row, &["id"], ""),
        user_id: str_field(row, &["user_id"], ""),
        property_id: str_field(row, &["property_id"], ""),
        created_at: date_field(row, &["created_at"]),
    }
}
