use std::future::Future;
use std::pin::Pin;

use crate::{ChangeEvent, Record, RecordError};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ════════════════════════════════════════════════════════════════
//  Store Gateway
// ════════════════════════════════════════════════════════════════

/// Durable record storage. Sole owner of the relational connection —
/// no other component talks to the store directly.
///
/// Implemented server-side (SqliteStore). This crate defines only the
/// trait, without a tokio dependency; implementations copy borrowed
/// arguments before entering the async block.
pub trait RecordStore: Send + Sync {
    /// All records, in id order.
    fn list(&self) -> BoxFuture<'_, Result<Vec<Record>, RecordError>>;

    /// Insert a record; the store assigns the id.
    fn create(&self, name: &str) -> BoxFuture<'_, Result<Record, RecordError>>;

    /// Rename an existing record. `NotFound` if the id is absent.
    fn update(&self, id: i64, name: &str) -> BoxFuture<'_, Result<Record, RecordError>>;

    /// Remove a record, returning its id. `NotFound` if absent.
    fn delete(&self, id: i64) -> BoxFuture<'_, Result<i64, RecordError>>;
}

// ════════════════════════════════════════════════════════════════
//  Notification seams
// ════════════════════════════════════════════════════════════════

/// Fan-out target for committed changes.
///
/// Publishing is infallible from the caller's perspective: delivery to
/// individual subscribers is best-effort, at-most-once, and contained
/// by the implementation. The mutation service depends on this seam so
/// the bus can be swapped or mocked without touching mutation logic.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: ChangeEvent) -> BoxFuture<'_, ()>;
}

/// One subscriber's inbound event stream.
///
/// Contract for any consumer (see the client sync agent): on *any*
/// received event, re-fetch the full collection via `RecordStore::list`
/// rather than applying the event payload — that is what makes the
/// bus's non-durable, unordered delivery acceptable. A consumer must
/// also fetch once on startup, since no event precedes initial state.
pub trait EventStream: Send {
    /// Next event. `None` = stream closed / subscription detached.
    fn recv(&mut self) -> BoxFuture<'_, Option<ChangeEvent>>;
}
