//! Client-side data core for a Vietnamese real-estate listings app.
//!
//! Caches properties, news, projects and the signed-in user from an
//! AppSheet-style table gateway, with one-time concurrent-safe
//! initialization, per-user request coalescing, synchronous filtered
//! queries and typed change notifications.

pub mod config;
pub mod dtos;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod service;
pub mod session;
pub mod transform;
pub mod utils;

pub use config::Config;
pub use error::{GatewayError, StoreError};
pub use gateway::{CallMonitor, ListingGateway, SheetClient};
pub use service::{
    ConsultationService, DataStore, ErrorState, FavoritesService, LoadingState, Resource,
    StoreEvent, Subscription,
};
pub use session::{InMemorySession, SessionCache};

use std::sync::Arc;

/// Composition root wiring the gateway, store and services together.
#[derive(Clone)]
pub struct AppState {
    pub env: Config,
    pub monitor: Arc<CallMonitor>,
    pub store: Arc<DataStore>,
    pub favorites: Arc<FavoritesService>,
    pub consultations: Arc<ConsultationService>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let client = Arc::new(SheetClient::new(config.clone()));
        let monitor = client.monitor();
        let session = Arc::new(InMemorySession::new());
        let store = Arc::new(DataStore::new(client.clone(), session));
        let favorites = Arc::new(FavoritesService::new(client.clone(), store.clone()));
        let consultations = Arc::new(ConsultationService::new(client));

        AppState {
            env: config,
            monitor,
            store,
            favorites,
            consultations,
        }
    }
}
