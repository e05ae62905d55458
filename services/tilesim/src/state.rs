use std::{collections::HashMap, sync::Arc};

use bytes::Bytes;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::config::SimConfig;
use crate::session::SessionRecord;

pub type SharedState = Arc<AppState>;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<String, SessionRecord>>>,
    /// Finished artifacts by file name.
    pub artifacts: Arc<RwLock<HashMap<String, Bytes>>>,
    pub config: SimConfig,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: SimConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            artifacts: Arc::new(RwLock::new(HashMap::new())),
            config,
            shutdown: CancellationToken::new(),
        }
    }

    pub async fn set_session(&self, session: SessionRecord) {
        self.sessions.write().await.insert(session.session_id.clone(), session);
    }

    /// Applies `f` to the session, or returns `None` if it has been cleaned up.
    pub async fn update_session<R, F: FnOnce(&mut SessionRecord) -> R>(&self, id: &str, f: F) -> Option<R> {
        self.sessions.write().await.get_mut(id).map(f)
    }

    pub async fn get_session(&self, id: &str) -> Option<SessionRecord> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Forgets the session and its artifact.
    pub async fn remove_session(&self, id: &str) -> Option<SessionRecord> {
        let removed = self.sessions.write().await.remove(id)?;
        if let Some(name) = &removed.display_name {
            self.artifacts.write().await.remove(name);
        }
        Some(removed)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn put_artifact(&self, file_name: String, body: Bytes) {
        self.artifacts.write().await.insert(file_name, body);
    }

    pub async fn get_artifact(&self, file_name: &str) -> Option<Bytes> {
        self.artifacts.read().await.get(file_name).cloned()
    }
}
