use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::events::{ClientEvent, ServerEvent};
use super::registry::ViewerRegistry;
use crate::models::{Family, NaturalKey};
use crate::store::CollectionStore;

/// Pushes canonical collection state and selection signals to viewers.
///
/// Snapshots are full-state pushes. Each family has its own lock held across
/// the store read and the fan-out, so a later publish can never deliver an
/// older list than an earlier one.
pub struct Broadcaster {
    store: Arc<dyn CollectionStore>,
    viewers: ViewerRegistry,
    timeline_lock: Mutex<()>,
    program_lock: Mutex<()>,
}

impl Broadcaster {
    pub fn new(store: Arc<dyn CollectionStore>, viewers: ViewerRegistry) -> Self {
        Self {
            store,
            viewers,
            timeline_lock: Mutex::new(()),
            program_lock: Mutex::new(()),
        }
    }

    pub fn viewers(&self) -> &ViewerRegistry {
        &self.viewers
    }

    fn lock(&self, family: Family) -> &Mutex<()> {
        match family {
            Family::Timeline => &self.timeline_lock,
            Family::Program => &self.program_lock,
        }
    }

    /// Re-read every collection of `family` and send the sorted list to all
    /// viewers. Failures are logged; the triggering mutation already succeeded.
    pub async fn publish_snapshot(&self, family: Family) {
        let _guard = self.lock(family).lock().await;
        match self.store.list(family).await {
            Ok(items) => {
                let count = items.len();
                let delivered = self
                    .viewers
                    .broadcast(Arc::new(ServerEvent::snapshot(family, items)));
                debug!(%family, count, delivered, "Published snapshot");
            }
            Err(e) => error!(%family, error = %e, "Failed to publish snapshot"),
        }
    }

    /// Relay a highlight to every viewer. `None` clears the highlight; a key
    /// that does not resolve emits nothing. Returns whether anything was sent.
    pub async fn publish_selection(&self, family: Family, key: Option<NaturalKey>) -> bool {
        let item = match key {
            None => None,
            Some(key) => match self.store.find_by_key(&key).await {
                Ok(Some(item)) => Some(item),
                Ok(None) => {
                    debug!(%family, %key, "Selection does not resolve; ignoring");
                    return false;
                }
                Err(e) => {
                    error!(%family, %key, error = %e, "Failed to resolve selection");
                    return false;
                }
            },
        };
        self.viewers
            .broadcast(Arc::new(ServerEvent::selection(family, item)));
        true
    }

    /// Send the current snapshot of every family to one newly connected
    /// session.
    pub async fn greet(&self, session_id: Uuid) {
        for family in Family::ALL {
            let _guard = self.lock(family).lock().await;
            match self.store.list(family).await {
                Ok(items) => {
                    self.viewers
                        .send_to(session_id, Arc::new(ServerEvent::snapshot(family, items)));
                }
                Err(e) => error!(%family, %session_id, error = %e, "Failed to load snapshot"),
            }
        }
    }

    pub async fn handle_client_event(&self, session_id: Uuid, event: ClientEvent) {
        match event {
            ClientEvent::Register(role) => {
                info!(%session_id, %role, "Viewer registered role");
                self.viewers.set_role(session_id, role);
            }
            ClientEvent::SelectYear(value) => self.select(Family::Timeline, value).await,
            ClientEvent::SelectProgram(value) => self.select(Family::Program, value).await,
        }
    }

    async fn select(&self, family: Family, value: Value) {
        let key = match value {
            Value::Null => None,
            other => match family.key_from_value(&other) {
                Ok(key) => Some(key),
                Err(_) => {
                    warn!(%family, value = %other, "Ignoring malformed selection");
                    return;
                }
            },
        };
        self.publish_selection(family, key).await;
    }
}
