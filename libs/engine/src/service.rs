use std::sync::Arc;

use recsync_api::{ChangeEvent, EventPublisher, Record, RecordError, RecordStore};

// ═══════════════════════════════════════════════════════════════
//  RecordService
// ═══════════════════════════════════════════════════════════════

/// Mutation service: validate → store → announce.
///
/// Mirrors the store gateway one-to-one, adding input validation
/// before any store call and, on success, the matching change event.
/// The event is published strictly *after* the store reports the write
/// committed, and the publish outcome never affects the caller's
/// result — the caller's own response already reflects store truth;
/// the notification is advisory for other connected clients.
pub struct RecordService {
    store: Arc<dyn RecordStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl RecordService {
    pub fn new(store: Arc<dyn RecordStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { store, publisher }
    }

    pub async fn list(&self) -> Result<Vec<Record>, RecordError> {
        self.store.list().await
    }

    pub async fn create(&self, name: &str) -> Result<Record, RecordError> {
        validate_name(name)?;
        let record = self.store.create(name).await?;
        tracing::info!(id = record.id, name = %record.name, "record created");
        self.publisher.publish(ChangeEvent::Added(record.clone())).await;
        Ok(record)
    }

    pub async fn update(&self, id: i64, name: &str) -> Result<Record, RecordError> {
        validate_name(name)?;
        let record = self.store.update(id, name).await?;
        tracing::info!(id, name = %record.name, "record updated");
        self.publisher.publish(ChangeEvent::Updated(record.clone())).await;
        Ok(record)
    }

    pub async fn delete(&self, id: i64) -> Result<i64, RecordError> {
        let id = self.store.delete(id).await?;
        tracing::info!(id, "record deleted");
        self.publisher.publish(ChangeEvent::Deleted { id }).await;
        Ok(id)
    }
}

/// Name must be present and non-blank. Checked before touching the
/// store; the message is surfaced verbatim in the 400 body.
fn validate_name(name: &str) -> Result<(), RecordError> {
    if name.trim().is_empty() {
        return Err(RecordError::validation("Name is required"));
    }
    Ok(())
}
