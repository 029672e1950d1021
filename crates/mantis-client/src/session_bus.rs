use mantis_types::SessionEvent;
use tokio::sync::broadcast;
use tracing::debug;

const DEFAULT_CAPACITY: usize = 16;

/// App-wide broadcast of session signals (logout, login redirect)
#[derive(Debug, Clone)]
pub struct SessionBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            debug!("Session event dropped: no subscribers");
        }
    }
}

impl Default for SessionBus {
    fn default() -> Self {
        Self::new()
    }
}
