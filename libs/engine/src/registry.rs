use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{RwLock, mpsc};

use recsync_api::{BoxFuture, ChangeEvent, EventPublisher, EventStream};

// ═══════════════════════════════════════════════════════════════
//  Subscription
// ═══════════════════════════════════════════════════════════════

/// Receiving half of one attached subscriber channel.
///
/// Dropping it closes the channel; the registry prunes the dead sender
/// on the next fan-out.
pub struct Subscription {
    token: u64,
    rx: mpsc::Receiver<ChangeEvent>,
}

impl Subscription {
    /// Opaque handle identifying this connection in the registry.
    pub fn token(&self) -> u64 {
        self.token
    }

    /// Next event. `None` = detached or registry dropped.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }
}

impl EventStream for Subscription {
    fn recv(&mut self) -> BoxFuture<'_, Option<ChangeEvent>> {
        Box::pin(async { self.rx.recv().await })
    }
}

// ═══════════════════════════════════════════════════════════════
//  ConnectionRegistry
// ═══════════════════════════════════════════════════════════════

struct Subscriber {
    token: u64,
    tx: mpsc::Sender<ChangeEvent>,
}

/// Set of currently connected subscriber channels.
///
/// Lifecycle: `attach` on connect, `detach` on disconnect or transport
/// error. The set is shared with the notification bus (the only
/// reader, during fan-out) and is safe to mutate concurrently with a
/// broadcast in progress — fan-out runs under the same lock and prunes
/// closed channels as it goes.
pub struct ConnectionRegistry {
    subscribers: RwLock<Vec<Subscriber>>,
    next_token: AtomicU64,
    buffer: usize,
}

impl ConnectionRegistry {
    /// `buffer` bounds each subscriber's channel; a subscriber that
    /// falls further behind loses events (see `fan_out`).
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_token: AtomicU64::new(1),
            buffer,
        }
    }

    pub async fn attach(&self) -> Subscription {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.buffer);
        let mut subs = self.subscribers.write().await;
        subs.push(Subscriber { token, tx });
        Subscription { token, rx }
    }

    pub async fn detach(&self, token: u64) {
        let mut subs = self.subscribers.write().await;
        if let Some(i) = subs.iter().position(|s| s.token == token) {
            subs.swap_remove(i);
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Deliver one event to every attached subscriber.
    ///
    /// Per-subscriber delivery is isolated: a full channel drops the
    /// event for that subscriber only (logged, at-most-once semantics),
    /// a closed channel is pruned inline. Neither outcome blocks or
    /// fails delivery to the rest.
    pub(crate) async fn fan_out(&self, event: &ChangeEvent) {
        let mut subs = self.subscribers.write().await;
        let mut i = 0;
        while i < subs.len() {
            let sub = &subs[i];
            match sub.tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        token = sub.token,
                        event = %event.kind(),
                        "subscriber channel full, dropping event"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!(token = sub.token, "pruning closed subscriber");
                    subs.swap_remove(i);
                    continue;
                }
            }
            i += 1;
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  NotificationBus
// ═══════════════════════════════════════════════════════════════

/// Process-wide broadcast of committed changes.
///
/// No queueing, no retry, no persistence: a subscriber attached at
/// fan-out time receives the event (best-effort), anyone else never
/// does. Acceptable because consumers re-fetch full state on every
/// event instead of applying deltas.
pub struct NotificationBus {
    registry: Arc<ConnectionRegistry>,
}

impl NotificationBus {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub async fn publish(&self, event: ChangeEvent) {
        tracing::debug!(event = %event.kind(), id = event.record_id(), "broadcasting change");
        self.registry.fan_out(&event).await;
    }
}

impl EventPublisher for NotificationBus {
    fn publish(&self, event: ChangeEvent) -> BoxFuture<'_, ()> {
        Box::pin(self.publish(event))
    }
}
