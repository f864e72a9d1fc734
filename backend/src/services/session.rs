//! In-process session store
//!
//! Holds each logged-in operator together with their scan context. The lock
//! is only taken for map access and is never held across a database call.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use shared::{PositionCode, ScanContext, Session};

#[derive(Debug, Clone)]
struct ActiveSession {
    session: Session,
    scan: ScanContext,
}

/// Sessions keyed by the id carried in the bearer token
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, ActiveSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session with an empty scan context
    pub async fn open(&self, session: Session) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.write().await.insert(
            id,
            ActiveSession {
                session,
                scan: ScanContext::default(),
            },
        );
        id
    }

    pub async fn get(&self, id: Uuid) -> Option<Session> {
        self.inner.read().await.get(&id).map(|s| s.session.clone())
    }

    /// Replace the pending position; returns false when the session is gone
    pub async fn set_position(&self, id: Uuid, position: PositionCode) -> bool {
        match self.inner.write().await.get_mut(&id) {
            Some(active) => {
                active.scan.set_position(position);
                true
            }
            None => false,
        }
    }

    pub async fn pending_position(&self, id: Uuid) -> Option<PositionCode> {
        self.inner
            .read()
            .await
            .get(&id)
            .and_then(|s| s.scan.pending_position().cloned())
    }

    /// Drop a session and its scan context
    pub async fn close(&self, id: Uuid) -> Option<Session> {
        self.inner.write().await.remove(&id).map(|s| s.session)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
