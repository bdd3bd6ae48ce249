use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::GatewayError;
use crate::gateway::monitor::CallMonitor;
use crate::gateway::ListingGateway;
use crate::transform::str_field;

/// Row actions supported by the tabular gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Find,
    Add,
    Edit,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Find => "Find",
            Action::Add => "Add",
            Action::Edit => "Edit",
            Action::Delete => "Delete",
        }
    }
}

/// HTTP client for the AppSheet-style table API.
///
/// Every operation is a POST to `{base}{app_id}/tables/{table}/Action`
/// carrying the `applicationAccessKey` header and a JSON body of
/// `{"Action", "Properties", "Rows"}`. Responses come back either as a bare
/// row array or wrapped in `{"Rows": [...]}`.
pub struct SheetClient {
    http: reqwest::Client,
    config: Config,
    monitor: Arc<CallMonitor>,
}

impl SheetClient {
    pub fn new(config: Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        SheetClient {
            http,
            config,
            monitor: Arc::new(CallMonitor::new()),
        }
    }

    pub fn monitor(&self) -> Arc<CallMonitor> {
        Arc::clone(&self.monitor)
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}{}/tables/{}/Action",
            self.config.base_url,
            self.config.app_id,
            urlencoding::encode(table)
        )
    }

    async fn action(
        &self,
        table: &str,
        action: Action,
        selector: Option<String>,
        row: Option<Value>,
    ) -> Result<Vec<Value>, GatewayError> {
        let url = self.table_url(table);

        let mut properties = serde_json::Map::new();
        if let Some(selector) = &selector {
            properties.insert("Selector".to_string(), Value::String(selector.clone()));
        }
        let rows: Vec<Value> = row.into_iter().collect();
        let body = json!({
            "Action": action.as_str(),
            "Properties": Value::Object(properties),
            "Rows": rows,
        });

        debug!(
            "{} on table {} (selector: {:?})",
            action.as_str(),
            table,
            selector
        );

        let response = self
            .http
            .post(&url)
            .header("applicationAccessKey", self.config.access_key.as_str())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message,
            });
        }

        // 204 and non-JSON bodies mean the write landed but there is
        // nothing to parse.
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if status == reqwest::StatusCode::NO_CONTENT || !content_type.contains("application/json")
        {
            return Ok(Vec::new());
        }

        let payload: Value = response.json().await?;
        Ok(rows_from_payload(payload))
    }

    async fn find(&self, table: &str) -> Result<Vec<Value>, GatewayError> {
        self.action(table, Action::Find, None, None).await
    }

    /// Filtered Find with an unfiltered retry. Some deployments reject the
    /// Selector property, so on failure we fetch the whole table and apply
    /// the same predicate locally.
    async fn find_filtered(
        &self,
        table: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Value>, GatewayError> {
        let selector = filter_selector(table, field, value);
        match self
            .action(table, Action::Find, Some(selector), None)
            .await
        {
            Ok(rows) => Ok(rows),
            Err(err) => {
                warn!(
                    "Filtered Find on {} failed ({}), retrying unfiltered",
                    table, err
                );
                let rows = self.find(table).await?;
                Ok(rows
                    .into_iter()
                    .filter(|row| str_field(row, &[field], "") == value)
                    .collect())
            }
        }
    }
}

#[async_trait]
impl ListingGateway for SheetClient {
    async fn fetch_properties(&self) -> Result<Vec<Value>, GatewayError> {
        self.monitor.record("Properties");
        self.find("Properties").await
    }

    async fn fetch_news(&self) -> Result<Vec<Value>, GatewayError> {
        self.monitor.record("News");
        self.find("News").await
    }

    async fn fetch_projects(&self) -> Result<Vec<Value>, GatewayError> {
        self.monitor.record("Projects");
        self.find("Projects").await
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<Value>, GatewayError> {
        self.monitor.record(&format!("Users(id:{})", user_id));
        let rows = self.find_filtered("Users", "id", user_id).await?;
        Ok(rows.into_iter().next())
    }

    async fn favorites_for(&self, user_id: &str) -> Result<Vec<Value>, GatewayError> {
        self.monitor.record(&format!("Favorites(user:{})", user_id));
        self.find_filtered("Favorites", "user_id", user_id).await
    }

    async fn add_favorite(&self, user_id: &str, property_id: &str) -> Result<(), GatewayError> {
        self.monitor.record(&format!(
            "FavoritesToggle(user:{}, property:{})",
            user_id, property_id
        ));
        let row = with_generated_fields(json!({
            "user_id": user_id,
            "property_id": property_id,
        }));
        self.action("Favorites", Action::Add, None, Some(row)).await?;
        Ok(())
    }

    async fn remove_favorite(
        &self,
        user_id: &str,
        property_id: &str,
    ) -> Result<(), GatewayError> {
        self.monitor.record(&format!(
            "FavoritesToggle(user:{}, property:{})",
            user_id, property_id
        ));

        // The table is keyed by row id, so resolve the favorite first.
        let rows = self.find_filtered("Favorites", "user_id", user_id).await?;
        let favorite = rows
            .into_iter()
            .find(|row| str_field(row, &["property_id"], "") == property_id);

        match favorite {
            Some(row) => {
                let id = str_field(&row, &["id"], "");
                self.action("Favorites", Action::Delete, None, Some(json!({ "id": id })))
                    .await?;
                Ok(())
            }
            None => {
                warn!(
                    "Favorite not found for user={} property={}",
                    user_id, property_id
                );
                Ok(())
            }
        }
    }

    async fn submit_consultation(&self, row: Value) -> Result<Value, GatewayError> {
        self.monitor.record("Consultations");
        let row = with_generated_fields(row);
        let stored = self
            .action("Consultations", Action::Add, None, Some(row.clone()))
            .await?;
        Ok(stored.into_iter().next().unwrap_or(row))
    }
}

fn filter_selector(table: &str, field: &str, value: &str) -> String {
    format!("Filter({}, [{}] = \"{}\")", table, field, value)
}

fn rows_from_payload(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(rows) => rows,
        Value::Object(mut map) => match map.remove("Rows") {
            Some(Value::Array(rows)) => rows,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Fills in id and timestamps for Add rows when the caller left them out.
fn with_generated_fields(mut row: Value) -> Value {
    if let Value::Object(map) = &mut row {
        let now = Utc::now().to_rfc3339();
        if !map.contains_key("id") {
            map.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        if !map.contains_key("created_at") {
            map.insert("created_at".to_string(), Value::String(now.clone()));
        }
        if !map.contains_key("updated_at") {
            map.insert("updated_at".to_string(), Value::String(now));
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        assert_eq!(Action::Find.as_str(), "Find");
        assert_eq!(Action::Add.as_str(), "Add");
        assert_eq!(Action::Edit.as_str(), "Edit");
        assert_eq!(Action::Delete.as_str(), "Delete");
    }

    #[test]
    fn test_table_url_encodes_table_name() {
        let client = SheetClient::new(Config::new("app-123", "secret"));
        assert_eq!(
            client.table_url("Saved Filters"),
            "https://www.appsheet.com/api/v2/apps/app-123/tables/Saved%20Filters/Action"
        );
    }

    #[test]
    fn test_filter_selector_format() {
        assert_eq!(
            filter_selector("Favorites", "user_id", "u1"),
            "Filter(Favorites, [user_id] = \"u1\")"
        );
    }

    #[test]
    fn test_rows_from_bare_array() {
        let rows = rows_from_payload(json!([{"id": "a"}, {"id": "b"}]));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_rows_from_wrapped_object() {
        let rows = rows_from_payload(json!({"Rows": [{"id": "a"}]}));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "a");
    }

    #[test]
    fn test_rows_from_unexpected_payload() {
        assert!(rows_from_payload(json!({"ok": true})).is_empty());
        assert!(rows_from_payload(json!("done")).is_empty());
    }

    #[test]
    fn test_generated_fields_fill_missing() {
        let row = with_generated_fields(json!({"user_id": "u1", "property_id": "p1"}));
        assert!(!row["id"].as_str().unwrap().is_empty());
        assert!(!row["created_at"].as_str().unwrap().is_empty());
        assert!(!row["updated_at"].as_str().unwrap().is_empty());
    }

    #[test]
    fn test_generated_fields_keep_existing() {
        let row = with_generated_fields(json!({"id": "fixed", "created_at": "2024-01-01"}));
        assert_eq!(row["id"], "fixed");
        assert_eq!(row["created_at"], "2024-01-01");
    }
}
