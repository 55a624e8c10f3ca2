//! # Listener Registry
//!
//! Process-wide set of connected `/ws` listeners.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  register() ──► (Subscription, Receiver)                                │
//! │                      │                                                  │
//! │                      └── Drop ──► listener removed                      │
//! │                                                                         │
//! │  publish(event):                                                        │
//! │    1. lock, clone the sender list, unlock                               │
//! │    2. try_send to each listener (bounded queue, never awaits)           │
//! │    3. full queue ──► event dropped for that listener                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

use super::protocol::ServerMessage;

/// Default per-listener queue depth.
pub const LISTENER_QUEUE_CAPACITY: usize = 64;

pub type ListenerId = Uuid;

type Listeners = HashMap<ListenerId, mpsc::Sender<ServerMessage>>;

#[derive(Debug, Clone)]
pub struct NotificationHub {
    listeners: Arc<Mutex<Listeners>>,
    capacity: usize,
}

impl Default for NotificationHub {
    fn default() -> Self {
        NotificationHub::new(LISTENER_QUEUE_CAPACITY)
    }
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        NotificationHub {
            listeners: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Listeners> {
        // The map stays consistent even if a holder panicked
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a listener. It stays registered until the guard is dropped.
    pub fn register(&self) -> (Subscription, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = Uuid::new_v4();

        let count = {
            let mut listeners = self.lock();
            listeners.insert(id, tx);
            listeners.len()
        };
        debug!(listener = %id, listeners = count, "Listener registered");

        let subscription = Subscription {
            id,
            hub: self.clone(),
        };
        (subscription, rx)
    }

    fn deregister(&self, id: ListenerId) {
        let count = {
            let mut listeners = self.lock();
            listeners.remove(&id);
            listeners.len()
        };
        debug!(listener = %id, listeners = count, "Listener removed");
    }

    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    /// Sends to every listener. Returns how many queues accepted it.
    pub fn broadcast(&self, message: ServerMessage) -> usize {
        self.publish(message, None)
    }

    /// Sends to every listener except `origin`.
    pub fn broadcast_except(&self, message: ServerMessage, origin: ListenerId) -> usize {
        self.publish(message, Some(origin))
    }

    /// Sends to a single listener.
    pub fn send_to(&self, id: ListenerId, message: ServerMessage) -> bool {
        let sender = self.lock().get(&id).cloned();
        match sender {
            Some(sender) => deliver(id, &sender, message),
            None => false,
        }
    }

    fn publish(&self, message: ServerMessage, exclude: Option<ListenerId>) -> usize {
        let targets: Vec<(ListenerId, mpsc::Sender<ServerMessage>)> = self
            .lock()
            .iter()
            .filter(|(id, _)| Some(**id) != exclude)
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        targets
            .iter()
            .filter(|(id, tx)| deliver(*id, tx, message.clone()))
            .count()
    }
}

fn deliver(id: ListenerId, sender: &mpsc::Sender<ServerMessage>, message: ServerMessage) -> bool {
    match sender.try_send(message) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!(listener = %id, "Listener queue full, notification dropped");
            false
        }
        Err(TrySendError::Closed(_)) => {
            debug!(listener = %id, "Listener already closed");
            false
        }
    }
}

/// Registration guard. Dropping it removes the listener.
#[derive(Debug)]
pub struct Subscription {
    id: ListenerId,
    hub: NotificationHub,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.deregister(self.id);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
