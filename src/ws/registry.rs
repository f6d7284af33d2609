use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::UserPosition;
use super::connctx::ConnHandle;

/// One connected participant.
#[derive(Debug)]
pub struct ClientSession {
    pub id: String,
    pub handle: ConnHandle,
    pub last_seen: Instant,
    pub position: Option<(f64, f64)>,
}

impl ClientSession {
    fn user_position(&self) -> Option<UserPosition> {
        self.position.map(|(x, y)| UserPosition {
            id: self.id.clone(),
            x,
            y,
        })
    }
}

#[derive(Default)]
struct RegistryInner {
    sessions: HashMap<String, ClientSession>,
    // conn_id -> logical id, one entry per live session
    conn_index: HashMap<Uuid, String>,
}

impl RegistryInner {
    fn take(&mut self, id: &str) -> Option<ClientSession> {
        let session = self.sessions.remove(id)?;
        self.conn_index.remove(&session.handle.conn_id);
        Some(session)
    }

    fn sweep(&mut self, now: Instant, timeout: Duration) -> Vec<String> {
        let stale: Vec<String> = self
            .sessions
            .values()
            .filter(|s| now.saturating_duration_since(s.last_seen) > timeout)
            .map(|s| s.id.clone())
            .collect();
        for id in &stale {
            self.take(id);
        }
        stale
    }

    fn positioned(&self) -> Vec<UserPosition> {
        self.sessions.values().filter_map(ClientSession::user_position).collect()
    }
}

/// Process-wide presence state: logical client id -> session.
///
/// Every operation takes the single registry lock for its whole duration, so
/// callers only ever see complete register/touch/remove/sweep steps. Nothing
/// hands out references into the map; lookups go through the id or conn id.
pub struct SessionRegistry {
    timeout: Duration,
    inner: Mutex<RegistryInner>,
}

impl SessionRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            inner: Mutex::new(RegistryInner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or replace the session for `id`. Any previous position is cleared
    /// and the previous connection handle is dropped. Returns whether an
    /// existing session was superseded.
    pub fn register(&self, id: &str, handle: ConnHandle) -> bool {
        let mut inner = self.lock();
        let previous = inner.take(id);
        inner.conn_index.insert(handle.conn_id, id.to_string());
        inner.sessions.insert(
            id.to_string(),
            ClientSession {
                id: id.to_string(),
                handle,
                last_seen: Instant::now(),
                position: None,
            },
        );
        if let Some(previous) = &previous {
            info!("Session {} superseded connection {}", id, previous.handle.conn_id);
        }
        previous.is_some()
    }

    /// Insert a session for `id` only when none exists, leaving a live
    /// connection's entry untouched. Returns whether the entry was created.
    pub fn register_if_absent(&self, id: &str, handle: ConnHandle) -> bool {
        let mut inner = self.lock();
        if inner.sessions.contains_key(id) {
            return false;
        }
        inner.conn_index.insert(handle.conn_id, id.to_string());
        inner.sessions.insert(
            id.to_string(),
            ClientSession {
                id: id.to_string(),
                handle,
                last_seen: Instant::now(),
                position: None,
            },
        );
        true
    }

    /// Update the position of a registered session. Unknown ids are ignored.
    pub fn touch(&self, id: &str, x: f64, y: f64) -> bool {
        let mut inner = self.lock();
        match inner.sessions.get_mut(id) {
            Some(session) => {
                session.position = Some((x, y));
                session.last_seen = Instant::now();
                true
            }
            None => {
                debug!("Ignoring position for unknown session {}", id);
                false
            }
        }
    }

    #[allow(dead_code)]
    pub fn remove(&self, id: &str) -> bool {
        self.lock().take(id).is_some()
    }

    /// Remove the session currently bound to `conn_id`. A connection that was
    /// superseded by a reconnect no longer owns an entry, so this is a no-op for it.
    pub fn remove_by_conn(&self, conn_id: Uuid) -> Option<String> {
        let mut inner = self.lock();
        let id = inner.conn_index.get(&conn_id)?.clone();
        inner.take(&id).map(|s| s.id)
    }

    pub fn id_for_conn(&self, conn_id: Uuid) -> Option<String> {
        self.lock().conn_index.get(&conn_id).cloned()
    }

    pub fn handle_for_conn(&self, conn_id: Uuid) -> Option<ConnHandle> {
        let inner = self.lock();
        let id = inner.conn_index.get(&conn_id)?;
        inner.sessions.get(id).map(|s| s.handle.clone())
    }

    /// Drop every session idle for longer than the timeout, returning their ids.
    pub fn sweep(&self) -> Vec<String> {
        let timeout = self.timeout;
        let swept = self.lock().sweep(Instant::now(), timeout);
        if !swept.is_empty() {
            info!("Swept {} stale session(s): {:?}", swept.len(), swept);
        }
        swept
    }

    /// Sweep, then list positioned sessions, under one lock acquisition.
    pub fn sweep_and_snapshot(&self) -> (Vec<UserPosition>, Vec<String>) {
        let timeout = self.timeout;
        let mut inner = self.lock();
        let swept = inner.sweep(Instant::now(), timeout);
        if !swept.is_empty() {
            info!("Swept {} stale session(s): {:?}", swept.len(), swept);
        }
        (inner.positioned(), swept)
    }

    /// Positioned sessions after a staleness sweep. Order is unspecified.
    pub fn snapshot(&self) -> Vec<UserPosition> {
        self.sweep_and_snapshot().0
    }

    /// Handles of every live connection, optionally skipping the one owned by `exclude_id`.
    pub fn recipients(&self, exclude_id: Option<&str>) -> Vec<ConnHandle> {
        self.lock()
            .sessions
            .values()
            .filter(|s| Some(s.id.as_str()) != exclude_id)
            .map(|s| s.handle.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().sessions.len()
    }

    pub fn positioned_count(&self) -> usize {
        self.lock().sessions.values().filter(|s| s.position.is_some()).count()
    }
}
