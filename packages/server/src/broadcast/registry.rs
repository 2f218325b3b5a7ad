use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::events::ServerEvent;

pub type EventSender = mpsc::UnboundedSender<Arc<ServerEvent>>;
pub type EventReceiver = mpsc::UnboundedReceiver<Arc<ServerEvent>>;

struct Session {
    role: Option<String>,
    sender: EventSender,
}

/// Connected viewer sessions.
///
/// Owned by the application state and shared by handle; register and
/// deregister may run concurrently with a broadcast.
#[derive(Clone, Default)]
pub struct ViewerRegistry {
    sessions: Arc<DashMap<Uuid, Session>>,
}

impl ViewerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session and return its id with the receiving half of its
    /// delivery channel.
    pub fn register(&self) -> (Uuid, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.sessions.insert(
            id,
            Session {
                role: None,
                sender: tx,
            },
        );
        (id, rx)
    }

    /// Tag a session with a display role. Not an authorization boundary.
    pub fn set_role(&self, id: Uuid, role: String) -> bool {
        match self.sessions.get_mut(&id) {
            Some(mut session) => {
                session.role = Some(role);
                true
            }
            None => false,
        }
    }

    pub fn role(&self, id: Uuid) -> Option<String> {
        self.sessions.get(&id).and_then(|s| s.role.clone())
    }

    pub fn deregister(&self, id: Uuid) -> bool {
        self.sessions.remove(&id).is_some()
    }

    /// Deliver to one session. Returns false if it is gone.
    pub fn send_to(&self, id: Uuid, event: Arc<ServerEvent>) -> bool {
        self.sessions
            .get(&id)
            .is_some_and(|s| s.sender.send(event).is_ok())
    }

    /// Deliver to every session and return how many accepted the event.
    ///
    /// Sessions whose receiver has gone away are pruned afterwards.
    pub fn broadcast(&self, event: Arc<ServerEvent>) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        for entry in self.sessions.iter() {
            if entry.sender.send(Arc::clone(&event)).is_ok() {
                delivered += 1;
            } else {
                closed.push(*entry.key());
            }
        }

        // Removing while iterating would deadlock on the shard lock.
        for id in closed {
            if self
                .sessions
                .remove_if(&id, |_, s| s.sender.is_closed())
                .is_some()
            {
                debug!(session_id = %id, "Pruned closed viewer session");
            }
        }

        delivered
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop every session, closing their channels.
    pub fn clear(&self) {
        self.sessions.clear();
    }
}
