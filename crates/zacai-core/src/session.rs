//! Per-session orchestrators sharing one sled database.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::knowledge::{MemoryVault, PersistentStore, SledVault};
use crate::orchestrator::{Orchestrator, PathwayRegistry};
use crate::shared::{AssistantSettings, DEFAULT_SESSION_ID};

/// Open sessions kept in memory before the least recently used one is dropped.
pub const DEFAULT_MAX_SESSIONS: usize = 64;

/// Trims `session_id`; absent or blank means [`DEFAULT_SESSION_ID`].
pub fn resolve_session_id(session_id: Option<&str>) -> String {
    session_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SESSION_ID)
        .to_string()
}

/// Span that tags every event emitted while serving `session_id`.
pub fn session_span(session_id: &str) -> tracing::Span {
    tracing::info_span!("session", session = %session_id)
}

struct SessionSlot {
    orchestrator: Arc<Orchestrator>,
    last_used: AtomicU64,
}

/// Each session owns an independent Knowledge Store and conversation log. With a sled
/// database, each session persists under its own tree namespace; without one, sessions
/// are ephemeral.
///
/// At most `capacity` sessions stay open. Opening one more drops the least recently used;
/// a sled-backed session reloads from disk the next time it is asked for.
pub struct SessionRegistry {
    db: Option<sled::Db>,
    registry: Arc<PathwayRegistry>,
    settings: AssistantSettings,
    sessions: DashMap<String, SessionSlot>,
    capacity: usize,
    clock: AtomicU64,
}

impl SessionRegistry {
    pub fn new(db: Option<sled::Db>, registry: Arc<PathwayRegistry>, settings: AssistantSettings) -> Self {
        Self {
            db,
            registry,
            settings,
            sessions: DashMap::new(),
            capacity: DEFAULT_MAX_SESSIONS,
            clock: AtomicU64::new(0),
        }
    }

    /// Caps the number of open sessions (minimum 1).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn cached(&self, id: &str) -> Option<Arc<Orchestrator>> {
        let slot = self.sessions.get(id)?;
        slot.last_used.store(self.tick(), Ordering::Relaxed);
        Some(Arc::clone(&slot.orchestrator))
    }

    /// Returns the orchestrator for `session_id`, opening it on first use.
    pub async fn get_or_open(&self, session_id: Option<&str>) -> Arc<Orchestrator> {
        let id = resolve_session_id(session_id);
        if let Some(existing) = self.cached(&id) {
            return existing;
        }
        self.open(id).await
    }

    /// Returns the orchestrator for `session_id` only if that session already exists,
    /// either open in memory or persisted in the sled database. Never creates one.
    pub async fn get(&self, session_id: Option<&str>) -> Option<Arc<Orchestrator>> {
        let id = resolve_session_id(session_id);
        if let Some(existing) = self.cached(&id) {
            return Some(existing);
        }
        match &self.db {
            Some(db) if SledVault::namespace_exists(db, &id) => Some(self.open(id).await),
            _ => None,
        }
    }

    async fn open(&self, id: String) -> Arc<Orchestrator> {
        let vault: Arc<dyn PersistentStore> = match &self.db {
            Some(db) => Arc::new(SledVault::with_db(db.clone(), &id)),
            None => Arc::new(MemoryVault::new()),
        };
        let opened = Arc::new(
            Orchestrator::open(vault, Arc::clone(&self.registry), self.settings.clone()).await,
        );
        tracing::info!(target: "zacai::chat", session = %id, "Session opened");

        // A concurrent open of the same id keeps whichever landed first.
        let orchestrator = {
            let slot = self.sessions.entry(id.clone()).or_insert_with(|| SessionSlot {
                orchestrator: opened,
                last_used: AtomicU64::new(0),
            });
            slot.last_used.store(self.tick(), Ordering::Relaxed);
            Arc::clone(&slot.orchestrator)
        };
        self.evict_over_capacity(&id);
        orchestrator
    }

    fn evict_over_capacity(&self, keep: &str) {
        while self.sessions.len() > self.capacity {
            let oldest = self
                .sessions
                .iter()
                .filter(|e| e.key() != keep)
                .min_by_key(|e| e.value().last_used.load(Ordering::Relaxed))
                .map(|e| e.key().clone());
            let Some(oldest) = oldest else { break };
            self.sessions.remove(&oldest);
            tracing::info!(target: "zacai::chat", session = %oldest, "Session evicted");
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
