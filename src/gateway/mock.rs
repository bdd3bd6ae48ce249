use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::GatewayError;
use crate::gateway::ListingGateway;
use crate::transform::str_field;

/// Per-operation failure switches. Flip one to make the corresponding
/// gateway call return a 500.
#[derive(Default)]
pub struct Failures {
    pub properties: AtomicBool,
    pub news: AtomicBool,
    pub projects: AtomicBool,
    pub users: AtomicBool,
    pub favorites: AtomicBool,
    pub toggle: AtomicBool,
    pub consultations: AtomicBool,
}

/// Per-operation call counters for asserting request volume.
#[derive(Default)]
pub struct CallCounters {
    pub properties: AtomicUsize,
    pub news: AtomicUsize,
    pub projects: AtomicUsize,
    pub find_user: AtomicUsize,
    pub favorites_for: AtomicUsize,
    pub add_favorite: AtomicUsize,
    pub remove_favorite: AtomicUsize,
    pub submit_consultation: AtomicUsize,
}

/// In-memory gateway double. Serves canned rows, keeps a live favorites
/// table, and can simulate slow or failing endpoints.
pub struct MockGateway {
    pub properties: Vec<Value>,
    pub news: Vec<Value>,
    pub projects: Vec<Value>,
    pub users: Vec<Value>,
    pub favorites: Mutex<Vec<Value>>,
    pub consultations: Mutex<Vec<Value>>,
    pub fail: Failures,
    pub delay_ms: u64,
    pub calls: CallCounters,
}

impl MockGateway {
    pub fn new() -> Self {
        MockGateway {
            properties: Vec::new(),
            news: Vec::new(),
            projects: Vec::new(),
            users: Vec::new(),
            favorites: Mutex::new(Vec::new()),
            consultations: Mutex::new(Vec::new()),
            fail: Failures::default(),
            delay_ms: 0,
            calls: CallCounters::default(),
        }
    }

    pub fn with_properties(mut self, rows: Vec<Value>) -> Self {
        self.properties = rows;
        self
    }

    pub fn with_news(mut self, rows: Vec<Value>) -> Self {
        self.news = rows;
        self
    }

    pub fn with_projects(mut self, rows: Vec<Value>) -> Self {
        self.projects = rows;
        self
    }

    pub fn with_users(mut self, rows: Vec<Value>) -> Self {
        self.users = rows;
        self
    }

    pub fn with_favorites(self, rows: Vec<Value>) -> Self {
        *self.favorites.lock().unwrap() = rows;
        self
    }

    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    pub fn favorite_rows(&self) -> Vec<Value> {
        self.favorites.lock().unwrap().clone()
    }

    pub fn submitted_consultations(&self) -> Vec<Value> {
        self.consultations.lock().unwrap().clone()
    }

    async fn pause(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        MockGateway::new()
    }
}

fn server_error(what: &str) -> GatewayError {
    GatewayError::Status {
        status: 500,
        message: format!("mock {} failure", what),
    }
}

#[async_trait]
impl ListingGateway for MockGateway {
    async fn fetch_properties(&self) -> Result<Vec<Value>, GatewayError> {
        self.calls.properties.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail.properties.load(Ordering::SeqCst) {
            return Err(server_error("properties"));
        }
        Ok(self.properties.clone())
    }

    async fn fetch_news(&self) -> Result<Vec<Value>, GatewayError> {
        self.calls.news.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail.news.load(Ordering::SeqCst) {
            return Err(server_error("news"));
        }
        Ok(self.news.clone())
    }

    async fn fetch_projects(&self) -> Result<Vec<Value>, GatewayError> {
        self.calls.projects.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail.projects.load(Ordering::SeqCst) {
            return Err(server_error("projects"));
        }
        Ok(self.projects.clone())
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<Value>, GatewayError> {
        self.calls.find_user.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail.users.load(Ordering::SeqCst) {
            return Err(server_error("users"));
        }
        Ok(self
            .users
            .iter()
            .find(|row| str_field(row, &["id"], "") == user_id)
            .cloned())
    }

    async fn favorites_for(&self, user_id: &str) -> Result<Vec<Value>, GatewayError> {
        self.calls.favorites_for.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail.favorites.load(Ordering::SeqCst) {
            return Err(server_error("favorites"));
        }
        Ok(self
            .favorites
            .lock()
            .unwrap()
            .iter()
            .filter(|row| str_field(row, &["user_id"], "") == user_id)
            .cloned()
            .collect())
    }

    async fn add_favorite(&self, user_id: &str, property_id: &str) -> Result<(), GatewayError> {
        self.calls.add_favorite.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail.toggle.load(Ordering::SeqCst) {
            return Err(server_error("toggle"));
        }
        self.favorites.lock().unwrap().push(json!({
            "id": format!("{}:{}", user_id, property_id),
            "user_id": user_id,
            "property_id": property_id,
            "created_at": Utc::now().to_rfc3339(),
        }));
        Ok(())
    }

    async fn remove_favorite(
        &self,
        user_id: &str,
        property_id: &str,
    ) -> Result<(), GatewayError> {
        self.calls.remove_favorite.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail.toggle.load(Ordering::SeqCst) {
            return Err(server_error("toggle"));
        }
        self.favorites.lock().unwrap().retain(|row| {
            !(str_field(row, &["user_id"], "") == user_id
                && str_field(row, &["property_id"], "") == property_id)
        });
        Ok(())
    }

    async fn submit_consultation(&self, row: Value) -> Result<Value, GatewayError> {
        self.calls.submit_consultation.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail.consultations.load(Ordering::SeqCst) {
            return Err(server_error("consultations"));
        }
        self.consultations.lock().unwrap().push(row.clone());
        Ok(row)
    }
}
