use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    services::{
        recommendations::CompletionClient, CatalogProvider, CategoryRegistry, FavoritesStore,
        IncrementalList,
    },
};

/// One list session; each has its own lock
pub type ListHandle = Arc<Mutex<IncrementalList>>;

/// A list session and the last time a request touched it
struct ListSession {
    handle: ListHandle,
    last_access: Instant,
}

/// Bounds on the in-memory list sessions
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    /// Sessions untouched for this long are dropped
    pub idle_ttl: Duration,
    /// Opening a session beyond this drops the least recently used one
    pub max_sessions: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(30 * 60),
            max_sessions: 1000,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogProvider>,
    pub registry: Arc<CategoryRegistry>,
    /// Serializes load-modify-save round trips on the watch-later list
    pub favorites: Arc<Mutex<FavoritesStore>>,
    lists: Arc<RwLock<HashMap<Uuid, ListSession>>>,
    pub session_limits: SessionLimits,
    pub recommender: Option<Arc<dyn CompletionClient>>,
}

impl AppState {
    /// Creates state with the built-in categories and no recommendation client
    pub fn new(catalog: Arc<dyn CatalogProvider>, favorites: FavoritesStore) -> Self {
        Self {
            catalog,
            registry: Arc::new(CategoryRegistry::builtin()),
            favorites: Arc::new(Mutex::new(favorites)),
            lists: Arc::new(RwLock::new(HashMap::new())),
            session_limits: SessionLimits::default(),
            recommender: None,
        }
    }

    pub fn with_recommender(mut self, recommender: Arc<dyn CompletionClient>) -> Self {
        self.recommender = Some(recommender);
        self
    }

    pub fn with_session_limits(mut self, limits: SessionLimits) -> Self {
        self.session_limits = limits;
        self
    }

    /// Looks up a list session and marks it as used
    pub async fn list(&self, id: Uuid) -> AppResult<ListHandle> {
        let mut lists = self.lists.write().await;
        let session = lists
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Unknown list session: {}", id)))?;
        session.last_access = Instant::now();
        Ok(session.handle.clone())
    }

    /// Stores a new session, first dropping idle ones and, at capacity, the least recently used
    pub async fn insert_list(&self, list: IncrementalList) -> (Uuid, ListHandle) {
        let now = Instant::now();
        let id = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(list));

        let mut lists = self.lists.write().await;
        self.evict_idle(&mut lists, now);

        while lists.len() >= self.session_limits.max_sessions.max(1) {
            let Some(oldest) = lists
                .iter()
                .min_by_key(|(_, session)| session.last_access)
                .map(|(id, _)| *id)
            else {
                break;
            };
            lists.remove(&oldest);
            tracing::info!(list_id = %oldest, "Dropped least recently used list session");
        }

        lists.insert(
            id,
            ListSession {
                handle: handle.clone(),
                last_access: now,
            },
        );
        (id, handle)
    }

    pub async fn remove_list(&self, id: Uuid) -> bool {
        self.lists.write().await.remove(&id).is_some()
    }

    /// Drops every session idle for longer than the configured TTL; returns how many went
    pub async fn evict_idle_lists(&self) -> usize {
        self.evict_idle_lists_at(Instant::now()).await
    }

    pub(crate) async fn evict_idle_lists_at(&self, now: Instant) -> usize {
        let mut lists = self.lists.write().await;
        self.evict_idle(&mut lists, now)
    }

    fn evict_idle(&self, lists: &mut HashMap<Uuid, ListSession>, now: Instant) -> usize {
        let before = lists.len();
        let ttl = self.session_limits.idle_ttl;
        lists.retain(|_, session| now.saturating_duration_since(session.last_access) <= ttl);

        let evicted = before - lists.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = lists.len(), "Expired idle list sessions");
        }
        evicted
    }

    /// Number of open list sessions
    pub async fn list_count(&self) -> usize {
        self.lists.read().await.len()
    }
}
