pub mod monitor;
pub mod sheet;

#[cfg(test)]
pub mod mock;

pub use monitor::CallMonitor;
pub use sheet::SheetClient;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::GatewayError;

/// Remote table access behind the store and services.
///
/// Implementations return raw rows; normalization into models happens in the
/// transform layer so gateway code stays purely about the wire.
#[async_trait]
pub trait ListingGateway: Send + Sync {
    async fn fetch_properties(&self) -> Result<Vec<Value>, GatewayError>;

    async fn fetch_news(&self) -> Result<Vec<Value>, GatewayError>;

    async fn fetch_projects(&self) -> Result<Vec<Value>, GatewayError>;

    /// Looks up a single user row by id. `Ok(None)` when no row matches.
    async fn find_user(&self, user_id: &str) -> Result<Option<Value>, GatewayError>;

    async fn favorites_for(&self, user_id: &str) -> Result<Vec<Value>, GatewayError>;

    async fn add_favorite(&self, user_id: &str, property_id: &str) -> Result<(), GatewayError>;

    async fn remove_favorite(&self, user_id: &str, property_id: &str)
        -> Result<(), GatewayError>;

    /// Persists a consultation request row and returns the stored row.
    async fn submit_consultation(&self, row: Value) -> Result<Value, GatewayError>;
}
