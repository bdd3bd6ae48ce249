use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::dtos::{NewsFilters, ProjectFilters, PropertyFilters};
use crate::error::GatewayError;
use crate::gateway::ListingGateway;
use crate::models::{NewsArticle, NewsStatus, Project, ProjectStatus, Property, TransactionType, User};
use crate::service::coalesce::RequestCoalescer;
use crate::service::notify::{Notifier, Resource, StoreEvent, Subscription};
use crate::session::SessionCache;
use crate::transform::{
    date_field, field, int_field, news_from_row, project_from_row, property_from_row, str_field,
    truthy, user_from_row,
};

/// Raw row cache partitioned by source table.
#[derive(Debug, Clone, Default)]
pub struct CacheData {
    pub properties: Vec<Value>,
    pub news: Vec<Value>,
    pub projects: Vec<Value>,
    pub current_user: Option<Value>,
}

/// Per-resource loading flags plus the aggregate `global` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadingState {
    pub properties: bool,
    pub news: bool,
    pub projects: bool,
    pub users: bool,
    pub current_user: bool,
    pub global: bool,
}

impl Default for LoadingState {
    fn default() -> Self {
        // Collections start as loading until the first bootstrap commits.
        LoadingState {
            properties: true,
            news: true,
            projects: true,
            users: false,
            current_user: false,
            global: true,
        }
    }
}

/// Last fetch error per resource, `None` when the latest attempt succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorState {
    pub properties: Option<String>,
    pub news: Option<String>,
    pub projects: Option<String>,
    pub users: Option<String>,
    pub current_user: Option<String>,
    pub global: Option<String>,
}

#[derive(Default)]
struct StoreState {
    data: CacheData,
    loading: LoadingState,
    errors: ErrorState,
    current_user_id: Option<String>,
}

/// Readiness of the store. `Initializing` carries the channel concurrent
/// callers wait on; `Ready` is the only state in which query accessors
/// serve data.
enum InitState {
    Uninitialized,
    Initializing(watch::Receiver<bool>),
    Ready,
}

/// What happens to cached rows when a fetch fails. Bootstrap records a
/// failed slot as empty; a manual refresh keeps the last good fetch.
#[derive(Clone, Copy)]
enum OnFetchError {
    ClearRows,
    KeepRows,
}

/// Shared cache of listing data sitting between the UI and the gateway.
///
/// One instance serves the whole process. `initialize` bootstraps all
/// collections exactly once no matter how many callers race it, query
/// accessors are synchronous over the cached rows, and every mutation
/// notifies subscribers through a typed event.
pub struct DataStore {
    gateway: Arc<dyn ListingGateway>,
    session: Arc<dyn SessionCache>,
    state: RwLock<StoreState>,
    init: Mutex<InitState>,
    user_loads: RequestCoalescer<String, Result<Option<Value>, String>>,
    notifier: Notifier,
}

// Resets a cancelled leader back to Uninitialized so the next
// initialize call can take over.
struct InitGuard<'a> {
    store: &'a DataStore,
    armed: bool,
}

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            *self.store.lock_init() = InitState::Uninitialized;
        }
    }
}

impl DataStore {
    pub fn new(gateway: Arc<dyn ListingGateway>, session: Arc<dyn SessionCache>) -> Self {
        DataStore {
            gateway,
            session,
            state: RwLock::new(StoreState::default()),
            init: Mutex::new(InitState::Uninitialized),
            user_loads: RequestCoalescer::new(),
            notifier: Notifier::new(),
        }
    }

    /// One-time bootstrap of all collections.
    ///
    /// The first caller fetches; everyone else arriving while that fetch
    /// runs awaits the same completion. Calls after completion return
    /// immediately. Source failures are isolated: a failed table records
    /// an error and an empty collection while its siblings still populate.
    pub async fn initialize(&self) {
        loop {
            let mut join_rx = None;
            let mut lead_tx = None;
            {
                let mut init = self.lock_init();
                match &*init {
                    InitState::Ready => return,
                    InitState::Initializing(rx) => join_rx = Some(rx.clone()),
                    InitState::Uninitialized => {
                        let (tx, rx) = watch::channel(false);
                        *init = InitState::Initializing(rx);
                        lead_tx = Some(tx);
                    }
                }
            }

            if let Some(tx) = lead_tx {
                debug!("Initializing data store");
                let mut guard = InitGuard {
                    store: self,
                    armed: true,
                };
                self.bootstrap().await;
                *self.lock_init() = InitState::Ready;
                guard.armed = false;
                let _ = tx.send(true);
                info!("Data store initialized");
                self.notifier.emit(StoreEvent::Initialized);
                return;
            }

            if let Some(mut rx) = join_rx {
                // A closed channel means the leader was dropped before
                // finishing; loop back and restart the state machine.
                if rx.wait_for(|done| *done).await.is_ok() {
                    return;
                }
            }
        }
    }

    async fn bootstrap(&self) {
        self.begin_loading(Resource::Properties);
        self.begin_loading(Resource::News);
        self.begin_loading(Resource::Projects);

        tokio::join!(
            self.load_properties(OnFetchError::ClearRows),
            self.load_news(OnFetchError::ClearRows),
            self.load_projects(OnFetchError::ClearRows),
        );

        // A user id may already be desired (warm start) without a row yet.
        let unresolved = {
            let state = self.read();
            match (&state.current_user_id, &state.data.current_user) {
                (Some(id), None) => Some(id.clone()),
                _ => None,
            }
        };
        if let Some(user_id) = unresolved {
            self.load_current_user(&user_id).await;
        }
    }

    /// Resolves the user row for `user_id` and makes it the current user.
    ///
    /// A cache hit (same id, row present) returns synchronously with no
    /// network call. Concurrent loads for the same id share one request.
    /// If a different id becomes current while this load is in flight, the
    /// late result is discarded rather than overwriting the newer state.
    pub async fn load_current_user(&self, user_id: &str) -> Option<User> {
        {
            let state = self.read();
            if state.current_user_id.as_deref() == Some(user_id) {
                if let Some(row) = &state.data.current_user {
                    return Some(user_from_row(row));
                }
            }
        }

        let begin_changed = {
            let mut state = self.write();
            let switching = state.current_user_id.as_deref() != Some(user_id);
            if switching {
                debug!("Switching current user to {}", user_id);
                state.current_user_id = Some(user_id.to_string());
                state.data.current_user = None;
            }
            let mut changed = switching;
            if !state.loading.current_user {
                state.loading.current_user = true;
                changed = true;
            }
            if state.errors.current_user.take().is_some() {
                changed = true;
            }
            changed
        };
        if begin_changed {
            self.notifier.emit(StoreEvent::LoadingChanged(Resource::CurrentUser));
        }

        let gateway = Arc::clone(&self.gateway);
        let id = user_id.to_string();
        let result = self
            .user_loads
            .run(user_id.to_string(), || async move {
                gateway.find_user(&id).await.map_err(|e| e.to_string())
            })
            .await;

        let mut session_row = None;
        let mut session_gone = false;
        let (outcome, changed) = {
            let mut state = self.write();
            if state.current_user_id.as_deref() != Some(user_id) {
                // A newer load owns the slot, including its loading flag.
                debug!("Discarding stale user load for {}", user_id);
                return None;
            }

            let mut changed = state.loading.current_user;
            state.loading.current_user = false;

            let outcome = match result {
                Ok(Some(row)) => {
                    if state.data.current_user.as_ref() != Some(&row) {
                        state.data.current_user = Some(row.clone());
                        changed = true;
                    }
                    if state.errors.current_user.take().is_some() {
                        changed = true;
                    }
                    let user = user_from_row(&row);
                    session_row = Some(row);
                    Some(user)
                }
                Ok(None) => {
                    info!("No user row found for {}", user_id);
                    if state.data.current_user.take().is_some() {
                        changed = true;
                    }
                    session_gone = true;
                    None
                }
                Err(err) => {
                    warn!("Failed to load user {}: {}", user_id, err);
                    if state.data.current_user.take().is_some() {
                        changed = true;
                    }
                    if state.errors.current_user.as_deref() != Some(err.as_str()) {
                        state.errors.current_user = Some(err);
                        changed = true;
                    }
                    None
                }
            };
            (outcome, changed)
        };

        if let Some(row) = &session_row {
            self.session.store(user_id, row);
        } else if session_gone {
            self.session.clear();
        }

        if changed {
            self.notifier.emit(StoreEvent::CurrentUserChanged);
        }
        outcome
    }

    /// Reconciles the store with an externally observed user id, for hosts
    /// that learn about sign-in state from a URL, a session or an auth
    /// layer. `Some(id)` loads that user; `None` clears the current user,
    /// pending loads and the session snapshot.
    pub async fn check_and_load_user(&self, observed: Option<&str>) -> Option<User> {
        match observed {
            Some(user_id) => self.load_current_user(user_id).await,
            None => {
                let had_user = {
                    let mut state = self.write();
                    let had = state.current_user_id.is_some();
                    state.current_user_id = None;
                    state.data.current_user = None;
                    state.loading.current_user = false;
                    state.errors.current_user = None;
                    had
                };
                if had_user {
                    info!("Current user cleared");
                    self.user_loads.clear();
                    self.session.clear();
                    self.notifier.emit(StoreEvent::CurrentUserChanged);
                }
                None
            }
        }
    }

    /// Last known user row from the session cache, usable before
    /// `initialize` for an optimistic first paint. Advisory only.
    pub fn warm_start_hint(&self) -> Option<User> {
        let (user_id, row) = self.session.load()?;
        debug!("Warm start hint for user {}", user_id);
        Some(user_from_row(&row))
    }

    /// Forced refetch. On failure the collection keeps its last good rows
    /// and only the error string changes.
    pub async fn refresh_properties(&self) {
        self.begin_loading(Resource::Properties);
        self.load_properties(OnFetchError::KeepRows).await;
    }

    pub async fn refresh_news(&self) {
        self.begin_loading(Resource::News);
        self.load_news(OnFetchError::KeepRows).await;
    }

    pub async fn refresh_projects(&self) {
        self.begin_loading(Resource::Projects);
        self.load_projects(OnFetchError::KeepRows).await;
    }

    /// Drops the cached user row and reloads it through the coalescer.
    pub async fn refresh_current_user(&self) -> Option<User> {
        let user_id = self.current_user_id()?;
        {
            let mut state = self.write();
            state.data.current_user = None;
        }
        self.load_current_user(&user_id).await
    }

    /// Full re-bootstrap: readiness drops while it runs, then every
    /// collection is refetched and readiness is signalled again.
    pub async fn refresh_all(&self) {
        info!("Refreshing all data");
        self.user_loads.clear();
        {
            let mut state = self.write();
            state.loading.global = true;
        }
        self.notifier.emit(StoreEvent::LoadingChanged(Resource::Global));

        *self.lock_init() = InitState::Uninitialized;
        self.initialize().await;

        {
            let mut state = self.write();
            state.loading.global = false;
        }
        self.notifier.emit(StoreEvent::LoadingChanged(Resource::Global));
    }

    pub fn is_initialized(&self) -> bool {
        matches!(&*self.lock_init(), InitState::Ready)
    }

    pub fn loading(&self) -> LoadingState {
        self.read().loading
    }

    pub fn errors(&self) -> ErrorState {
        self.read().errors.clone()
    }

    pub fn current_user_id(&self) -> Option<String> {
        self.read().current_user_id.clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.read().data.current_user.as_ref().map(user_from_row)
    }

    /// Registers a callback for store events. Delivery stops when the
    /// returned guard is dropped.
    pub fn subscribe(
        &self,
        callback: impl Fn(&StoreEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.notifier.subscribe(callback)
    }

    pub fn get_properties(&self, filters: Option<&PropertyFilters>) -> Vec<Property> {
        if !self.is_initialized() {
            return Vec::new();
        }
        let state = self.read();
        state
            .data
            .properties
            .iter()
            .filter(|row| filters.map_or(true, |f| property_matches(row, f)))
            .map(property_from_row)
            .collect()
    }

    pub fn get_property(&self, id: &str) -> Option<Property> {
        if !self.is_initialized() {
            return None;
        }
        let state = self.read();
        state
            .data
            .properties
            .iter()
            .find(|row| str_field(row, &["id", "property_id"], "") == id)
            .map(property_from_row)
    }

    /// Published articles, newest first by publish date (falling back to
    /// creation date), optionally filtered and capped.
    pub fn get_news(&self, filters: Option<&NewsFilters>) -> Vec<NewsArticle> {
        if !self.is_initialized() {
            return Vec::new();
        }
        let state = self.read();
        let mut rows: Vec<&Value> = state
            .data
            .news
            .iter()
            .filter(|row| {
                NewsStatus::from_str(&str_field(row, &["status"], "")) == NewsStatus::Published
            })
            .filter(|row| filters.map_or(true, |f| news_matches(row, f)))
            .collect();

        rows.sort_by(|a, b| {
            by_date_desc(
                date_field(a, &["published_at", "created_at"]),
                date_field(b, &["published_at", "created_at"]),
            )
        });

        if let Some(limit) = filters.and_then(|f| f.limit) {
            rows.truncate(limit);
        }
        rows.into_iter().map(news_from_row).collect()
    }

    pub fn get_news_article(&self, id: &str) -> Option<NewsArticle> {
        if !self.is_initialized() {
            return None;
        }
        let state = self.read();
        state
            .data
            .news
            .iter()
            .find(|row| str_field(row, &["id", "news_id"], "") == id)
            .map(news_from_row)
    }

    /// Projects with featured entries first, then newest launch date.
    pub fn get_projects(&self, filters: Option<&ProjectFilters>) -> Vec<Project> {
        if !self.is_initialized() {
            return Vec::new();
        }
        let state = self.read();
        let mut rows: Vec<&Value> = state
            .data
            .projects
            .iter()
            .filter(|row| filters.map_or(true, |f| project_matches(row, f)))
            .collect();

        rows.sort_by(|a, b| {
            let a_featured = truthy(field(a, "is_featured"));
            let b_featured = truthy(field(b, "is_featured"));
            b_featured.cmp(&a_featured).then_with(|| {
                by_date_desc(
                    date_field(a, &["launch_date", "created_at"]),
                    date_field(b, &["launch_date", "created_at"]),
                )
            })
        });

        if let Some(limit) = filters.and_then(|f| f.limit) {
            rows.truncate(limit);
        }
        rows.into_iter().map(project_from_row).collect()
    }

    pub fn get_project(&self, id: &str) -> Option<Project> {
        if !self.is_initialized() {
            return None;
        }
        let state = self.read();
        state
            .data
            .projects
            .iter()
            .find(|row| str_field(row, &["id", "project_id"], "") == id)
            .map(project_from_row)
    }

    async fn load_properties(&self, on_error: OnFetchError) {
        let result = self.gateway.fetch_properties().await;
        self.commit_rows(Resource::Properties, result, on_error);
    }

    async fn load_news(&self, on_error: OnFetchError) {
        let result = self.gateway.fetch_news().await;
        self.commit_rows(Resource::News, result, on_error);
    }

    async fn load_projects(&self, on_error: OnFetchError) {
        let result = self.gateway.fetch_projects().await;
        self.commit_rows(Resource::Projects, result, on_error);
    }

    fn begin_loading(&self, resource: Resource) {
        let changed = {
            let mut guard = self.write();
            let state = &mut *guard;
            let (flag, error) = match resource {
                Resource::Properties => {
                    (&mut state.loading.properties, &mut state.errors.properties)
                }
                Resource::News => (&mut state.loading.news, &mut state.errors.news),
                Resource::Projects => (&mut state.loading.projects, &mut state.errors.projects),
                Resource::Users => (&mut state.loading.users, &mut state.errors.users),
                Resource::CurrentUser => {
                    (&mut state.loading.current_user, &mut state.errors.current_user)
                }
                Resource::Global => (&mut state.loading.global, &mut state.errors.global),
            };
            let mut changed = !*flag;
            *flag = true;
            if error.take().is_some() {
                changed = true;
            }
            changed
        };
        if changed {
            self.notifier.emit(StoreEvent::LoadingChanged(resource));
        }
    }

    fn commit_rows(
        &self,
        resource: Resource,
        result: Result<Vec<Value>, GatewayError>,
        on_error: OnFetchError,
    ) {
        let event = match result {
            Ok(rows) => {
                debug!("Loaded {} rows for {:?}", rows.len(), resource);
                {
                    let mut state = self.write();
                    match resource {
                        Resource::Properties => {
                            state.data.properties = rows;
                            state.loading.properties = false;
                            state.errors.properties = None;
                        }
                        Resource::News => {
                            state.data.news = rows;
                            state.loading.news = false;
                            state.errors.news = None;
                        }
                        Resource::Projects => {
                            state.data.projects = rows;
                            state.loading.projects = false;
                            state.errors.projects = None;
                        }
                        _ => {}
                    }
                }
                StoreEvent::DataArrived(resource)
            }
            Err(err) => {
                warn!("Failed to load {:?}: {}", resource, err);
                let clear = matches!(on_error, OnFetchError::ClearRows);
                {
                    let mut state = self.write();
                    match resource {
                        Resource::Properties => {
                            if clear {
                                state.data.properties = Vec::new();
                            }
                            state.loading.properties = false;
                            state.errors.properties = Some(err.to_string());
                        }
                        Resource::News => {
                            if clear {
                                state.data.news = Vec::new();
                            }
                            state.loading.news = false;
                            state.errors.news = Some(err.to_string());
                        }
                        Resource::Projects => {
                            if clear {
                                state.data.projects = Vec::new();
                            }
                            state.loading.projects = false;
                            state.errors.projects = Some(err.to_string());
                        }
                        _ => {}
                    }
                }
                StoreEvent::ErrorChanged(resource)
            }
        };
        self.notifier.emit(event);
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(|p| p.into_inner())
    }

    fn lock_init(&self) -> MutexGuard<'_, InitState> {
        self.init.lock().unwrap_or_else(|p| p.into_inner())
    }
}

fn property_matches(row: &Value, filters: &PropertyFilters) -> bool {
    if let Some(want) = filters.transaction_type {
        if TransactionType::from_str(&str_field(row, &["transaction_type"], "")) != Some(want) {
            return false;
        }
    }
    if let Some(want) = &filters.property_type {
        if &str_field(row, &["property_type"], "") != want {
            return false;
        }
    }
    if let Some(min) = filters.min_price {
        if int_field(row, "price") < min {
            return false;
        }
    }
    if let Some(max) = filters.max_price {
        if int_field(row, "price") > max {
            return false;
        }
    }
    if let Some(want) = &filters.district {
        if &str_field(row, &["district"], "") != want {
            return false;
        }
    }
    if let Some(want) = &filters.city {
        if &str_field(row, &["city"], "") != want {
            return false;
        }
    }
    if let Some(want) = filters.featured {
        if truthy(field(row, "is_featured")) != want {
            return false;
        }
    }
    if let Some(term) = &filters.search {
        let haystack = format!(
            "{} {} {}",
            str_field(row, &["title", "property_title"], ""),
            str_field(row, &["description"], ""),
            str_field(row, &["address"], "")
        )
        .to_lowercase();
        if !haystack.contains(&term.to_lowercase()) {
            return false;
        }
    }
    true
}

fn news_matches(row: &Value, filters: &NewsFilters) -> bool {
    if let Some(want) = &filters.category {
        if &str_field(row, &["category"], "") != want {
            return false;
        }
    }
    if let Some(term) = &filters.search {
        let haystack = format!(
            "{} {}",
            str_field(row, &["title"], ""),
            str_field(row, &["content"], "")
        )
        .to_lowercase();
        if !haystack.contains(&term.to_lowercase()) {
            return false;
        }
    }
    true
}

fn project_matches(row: &Value, filters: &ProjectFilters) -> bool {
    if let Some(want) = filters.status {
        if ProjectStatus::from_str(&str_field(row, &["status"], "")) != want {
            return false;
        }
    }
    if let Some(want) = &filters.developer {
        if &str_field(row, &["developer"], "") != want {
            return false;
        }
    }
    if let Some(want) = filters.featured {
        if truthy(field(row, "is_featured")) != want {
            return false;
        }
    }
    if let Some(term) = &filters.search {
        let haystack = format!(
            "{} {} {}",
            str_field(row, &["title", "project_name"], ""),
            str_field(row, &["description"], ""),
            str_field(row, &["developer"], "")
        )
        .to_lowercase();
        if !haystack.contains(&term.to_lowercase()) {
            return false;
        }
    }
    true
}

fn by_date_desc(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
