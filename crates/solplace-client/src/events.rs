//! Canvas event streaming for presentation layers

use crate::{activity::ActivityEntry, session::SessionPhase, status::ConnectionStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Events emitted by a mounted view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CanvasEvent {
    /// An authoritative snapshot replaced the working view
    SnapshotApplied { pixel_count: u64, changed_cells: usize },

    /// New activity entries, newest first
    Activity(Vec<ActivityEntry>),

    /// Session key moved to a new phase
    SessionChanged(SessionPhase),

    /// Rollup connectivity changed
    ConnectionChanged(ConnectionStatus),

    /// The account subscription stopped delivering updates
    SubscriptionEnded,
}

/// Broadcast stream of canvas events
pub struct EventStream {
    sender: broadcast::Sender<CanvasEvent>,
}

impl EventStream {
    /// Create a new event stream
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<CanvasEvent> {
        self.sender.subscribe()
    }

    /// Emit an event
    pub fn emit(&self, event: CanvasEvent) {
        // Without receivers the event is dropped.
        if let Ok(count) = self.sender.send(event) {
            debug!("Event sent to {} receivers", count);
        }
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventStream {
    fn default() -> Self {
        Self::new(256)
    }
}
