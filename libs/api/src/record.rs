use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════
//  Record
// ════════════════════════════════════════════════════════════════

/// A row of the `records` collection.
///
/// `id` is assigned by the store (auto-increment) and immutable once
/// created; callers never choose it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub name: String,
}

// ════════════════════════════════════════════════════════════════
//  ChangeKind
// ════════════════════════════════════════════════════════════════

/// What happened to a record. Wire names match the original event
/// vocabulary: `added`, `updated`, `deleted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Updated,
    Deleted,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Updated => "updated",
            ChangeKind::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ════════════════════════════════════════════════════════════════
//  ChangeEvent
// ════════════════════════════════════════════════════════════════

/// A committed store mutation, announced to subscribers.
///
/// Constructed only after the store reports success, consumed once by
/// the notification bus, never persisted. Added/Updated carry the full
/// record; Deleted carries the id only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Added(Record),
    Updated(Record),
    Deleted { id: i64 },
}

impl ChangeEvent {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::Added(_) => ChangeKind::Added,
            ChangeEvent::Updated(_) => ChangeKind::Updated,
            ChangeEvent::Deleted { .. } => ChangeKind::Deleted,
        }
    }

    /// Wire payload: the record object for Added/Updated, `{"id": N}`
    /// for Deleted.
    pub fn payload(&self) -> serde_json::Value {
        match self {
            ChangeEvent::Added(record) | ChangeEvent::Updated(record) => {
                serde_json::json!(record)
            }
            ChangeEvent::Deleted { id } => serde_json::json!({ "id": id }),
        }
    }

    /// Id of the affected record.
    pub fn record_id(&self) -> i64 {
        match self {
            ChangeEvent::Added(record) | ChangeEvent::Updated(record) => record.id,
            ChangeEvent::Deleted { id } => *id,
        }
    }
}
