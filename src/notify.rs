use tokio::sync::broadcast;
use uuid::Uuid;

/// Fire-and-forget live-update channel. After a successful event mutation
/// the affected user id is broadcast so connected clients can refresh that
/// user's calendar. No delivery guarantee, no payload beyond the id.
#[derive(Clone)]
pub struct EventNotifier {
    tx: broadcast::Sender<Uuid>,
}

impl EventNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn notify(&self, user_id: Uuid) {
        // Send fails only when nobody is listening.
        let _ = self.tx.send(user_id);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Uuid> {
        self.tx.subscribe()
    }
}

impl Default for EventNotifier {
    fn default() -> Self {
        Self::new()
    }
}
