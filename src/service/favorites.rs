use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::gateway::ListingGateway;
use crate::service::data_store::DataStore;
use crate::transform::str_field;

#[derive(Default)]
struct FavState {
    favorites: HashSet<String>,
    synced_user: Option<String>,
    loading: bool,
    error: Option<String>,
}

/// Per-user favorites with in-flight toggle tracking.
///
/// The cached id set is tagged with the user it was synced for, so a user
/// switch makes it invisible immediately instead of leaking one user's
/// favorites into another's session. Membership changes commit only after
/// the gateway confirms them.
pub struct FavoritesService {
    gateway: Arc<dyn ListingGateway>,
    store: Arc<DataStore>,
    state: RwLock<FavState>,
    toggling: Mutex<HashSet<String>>,
}

// Clears the in-flight marker on every exit path of a toggle.
struct ToggleGuard<'a> {
    service: &'a FavoritesService,
    property_id: &'a str,
}

impl Drop for ToggleGuard<'_> {
    fn drop(&mut self) {
        self.service.lock_toggling().remove(self.property_id);
    }
}

impl FavoritesService {
    pub fn new(gateway: Arc<dyn ListingGateway>, store: Arc<DataStore>) -> Self {
        FavoritesService {
            gateway,
            store,
            state: RwLock::new(FavState::default()),
            toggling: Mutex::new(HashSet::new()),
        }
    }

    /// Rebuilds the favorite set for the store's current user. With no
    /// user signed in the set is cleared.
    pub async fn refresh(&self) {
        let user_id = match self.store.current_user_id() {
            Some(id) => id,
            None => {
                let mut state = self.write();
                state.favorites.clear();
                state.synced_user = None;
                state.loading = false;
                state.error = None;
                return;
            }
        };

        {
            let mut state = self.write();
            state.loading = true;
            state.error = None;
        }

        match self.gateway.favorites_for(&user_id).await {
            Ok(rows) => {
                let favorites: HashSet<String> = rows
                    .iter()
                    .map(|row| str_field(row, &["property_id"], ""))
                    .filter(|id| !id.is_empty())
                    .collect();
                info!("Loaded {} favorites for user {}", favorites.len(), user_id);
                let mut state = self.write();
                state.favorites = favorites;
                state.synced_user = Some(user_id);
                state.loading = false;
            }
            Err(err) => {
                warn!("Failed to load favorites for {}: {}", user_id, err);
                let mut state = self.write();
                state.favorites.clear();
                state.synced_user = Some(user_id);
                state.loading = false;
                state.error = Some(err.to_string());
            }
        }
    }

    /// Membership check. Only answers for the set synced to the store's
    /// current user.
    pub fn is_favorite(&self, property_id: &str) -> bool {
        let current = self.store.current_user_id();
        if current.is_none() {
            return false;
        }
        let state = self.read();
        state.synced_user == current && state.favorites.contains(property_id)
    }

    /// Favorite property ids for the current user, sorted for stable
    /// output.
    pub fn favorites(&self) -> Vec<String> {
        let current = self.store.current_user_id();
        let state = self.read();
        if current.is_some() && state.synced_user == current {
            let mut ids: Vec<String> = state.favorites.iter().cloned().collect();
            ids.sort();
            ids
        } else {
            Vec::new()
        }
    }

    pub fn is_toggling(&self, property_id: &str) -> bool {
        self.lock_toggling().contains(property_id)
    }

    pub fn loading(&self) -> bool {
        self.read().loading
    }

    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    /// Flips membership of `property_id` for the current user and returns
    /// the new state.
    ///
    /// Exactly one add or remove goes to the gateway per call. A second
    /// toggle for the same id while one is in flight is rejected; other
    /// ids proceed independently. On failure the set keeps its pre-toggle
    /// value.
    pub async fn toggle_favorite(&self, property_id: &str) -> Result<bool, StoreError> {
        let user_id = match self.store.current_user_id() {
            Some(id) => id,
            None => return Err(StoreError::AuthRequired),
        };

        {
            let mut toggling = self.lock_toggling();
            if !toggling.insert(property_id.to_string()) {
                debug!("Toggle already in flight for {}", property_id);
                return Err(StoreError::ToggleInFlight(property_id.to_string()));
            }
        }
        let _guard = ToggleGuard {
            service: self,
            property_id,
        };

        // After a user switch the cached set belongs to someone else.
        let synced = self.read().synced_user.as_deref() == Some(user_id.as_str());
        if !synced {
            self.refresh().await;
        }

        let currently = {
            let state = self.read();
            state.synced_user.as_deref() == Some(user_id.as_str())
                && state.favorites.contains(property_id)
        };

        let result = if currently {
            self.gateway.remove_favorite(&user_id, property_id).await
        } else {
            self.gateway.add_favorite(&user_id, property_id).await
        };

        match result {
            Ok(()) => {
                let now_favorite = !currently;
                let mut state = self.write();
                if state.synced_user.as_deref() == Some(user_id.as_str()) {
                    if now_favorite {
                        state.favorites.insert(property_id.to_string());
                    } else {
                        state.favorites.remove(property_id);
                    }
                }
                debug!(
                    "Favorite {} for user {}: now {}",
                    property_id, user_id, now_favorite
                );
                Ok(now_favorite)
            }
            Err(err) => {
                warn!("Favorite toggle failed for {}: {}", property_id, err);
                Err(StoreError::Gateway(err))
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, FavState> {
        self.state.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, FavState> {
        self.state.write().unwrap_or_else(|p| p.into_inner())
    }

    fn lock_toggling(&self) -> MutexGuard<'_, HashSet<String>> {
        self.toggling.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::MockGateway;
    use crate::session::InMemorySession;
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn gateway_with_users() -> MockGateway {
        MockGateway::new().with_users(vec![
            json!({"id": "u1", "full_name": "Nguyễn Văn An"}),
            json!({"id": "u2", "full_name": "Trần Thị Bình"}),
        ])
    }

    fn favorite_row(user_id: &str, property_id: &str) -> serde_json::Value {
        json!({
            "id": format!("{}:{}", user_id, property_id),
            "user_id": user_id,
            "property_id": property_id,
            "created_at": "2024-01-01T00:00:00Z",
        })
    }

    fn build(gateway: MockGateway) -> (Arc<FavoritesService>, Arc<MockGateway>, Arc<DataStore>) {
        let gateway = Arc::new(gateway);
        let store = Arc::new(DataStore::new(
            gateway.clone(),
            Arc::new(InMemorySession::new()),
        ));
        let service = Arc::new(FavoritesService::new(gateway.clone(), store.clone()));
        (service, gateway, store)
    }

    #[tokio::test]
    async fn test_toggle_without_user_is_rejected() {
        let (service, gateway, _) = build(gateway_with_users());

        let result = service.toggle_favorite("p1").await;

        assert!(matches!(result, Err(StoreError::AuthRequired)));
        assert_eq!(gateway.calls.add_favorite.load(Ordering::SeqCst), 0);
        assert_eq!(gateway.calls.remove_favorite.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_toggle_adds_then_removes() {
        let (service, gateway, store) = build(gateway_with_users());
        store.load_current_user("u1").await;
        service.refresh().await;

        let added = service.toggle_favorite("p1").await.unwrap();
        assert!(added);
        assert!(service.is_favorite("p1"));
        assert_eq!(gateway.favorite_rows().len(), 1);

        let removed = service.toggle_favorite("p1").await.unwrap();
        assert!(!removed);
        assert!(!service.is_favorite("p1"));
        assert!(gateway.favorite_rows().is_empty());

        assert_eq!(gateway.calls.add_favorite.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.calls.remove_favorite.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_toggle_keeps_previous_state() {
        let gateway = gateway_with_users().with_favorites(vec![favorite_row("u1", "p1")]);
        let (service, gateway, store) = build(gateway);
        store.load_current_user("u1").await;
        service.refresh().await;
        assert!(service.is_favorite("p1"));

        gateway.fail.toggle.store(true, Ordering::SeqCst);
        let result = service.toggle_favorite("p1").await;

        assert!(matches!(result, Err(StoreError::Gateway(_))));
        assert!(service.is_favorite("p1"));
        assert!(!service.is_toggling("p1"));
        assert_eq!(gateway.calls.remove_favorite.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_same_id_in_flight_rejected_other_ids_proceed() {
        let (service, gateway, store) = build(gateway_with_users().with_delay(30));
        store.load_current_user("u1").await;
        service.refresh().await;

        let slow = {
            let service = service.clone();
            tokio::spawn(async move { service.toggle_favorite("p1").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(service.is_toggling("p1"));
        let blocked = service.toggle_favorite("p1").await;
        assert!(matches!(blocked, Err(StoreError::ToggleInFlight(_))));

        let other = service.toggle_favorite("p2").await.unwrap();
        assert!(other);

        let first = slow.await.unwrap().unwrap();
        assert!(first);
        assert!(!service.is_toggling("p1"));
        assert_eq!(gateway.calls.add_favorite.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_user_switch_hides_other_users_set() {
        let gateway = gateway_with_users().with_favorites(vec![favorite_row("u1", "p1")]);
        let (service, _, store) = build(gateway);

        store.load_current_user("u1").await;
        service.refresh().await;
        assert!(service.is_favorite("p1"));
        assert_eq!(service.favorites(), vec!["p1"]);

        store.load_current_user("u2").await;
        assert!(!service.is_favorite("p1"));
        assert!(service.favorites().is_empty());

        service.refresh().await;
        assert!(!service.is_favorite("p1"));
    }

    #[tokio::test]
    async fn test_refresh_without_user_clears_set() {
        let gateway = gateway_with_users().with_favorites(vec![favorite_row("u1", "p1")]);
        let (service, _, store) = build(gateway);

        store.load_current_user("u1").await;
        service.refresh().await;
        assert!(service.is_favorite("p1"));

        store.check_and_load_user(None).await;
        service.refresh().await;
        assert!(service.favorites().is_empty());
        assert!(!service.is_favorite("p1"));
    }

    #[tokio::test]
    async fn test_toggle_resyncs_after_user_switch() {
        let gateway = gateway_with_users().with_favorites(vec![
            favorite_row("u1", "p1"),
            favorite_row("u2", "p1"),
        ]);
        let (service, gateway, store) = build(gateway);

        store.load_current_user("u1").await;
        service.refresh().await;

        // Switch users without an explicit refresh; the toggle must sync
        // to u2's set before deciding add vs remove.
        store.load_current_user("u2").await;
        let now = service.toggle_favorite("p1").await.unwrap();

        assert!(!now);
        assert_eq!(gateway.calls.remove_favorite.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.calls.add_favorite.load(Ordering::SeqCst), 0);
    }
}
