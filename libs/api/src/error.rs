/// Error taxonomy for record operations.
///
/// Kinds map one-to-one onto HTTP statuses at the REST layer:
/// Validation → 400, NotFound → 404, Store → 500. Subscriber delivery
/// failures are deliberately absent — they are contained inside the
/// notification bus and never surface to a mutating caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// Caller input malformed. Message is surfaced verbatim.
    #[error("{0}")]
    Validation(String),

    /// No record with this id. Not retried.
    #[error("record {0} not found")]
    NotFound(i64),

    /// Store I/O or connection failure. Surfaced with a generic
    /// message; the detail stays in `details` / logs.
    #[error("store: {0}")]
    Store(String),
}

impl RecordError {
    pub fn validation(msg: impl Into<String>) -> Self {
        RecordError::Validation(msg.into())
    }

    pub fn store(msg: impl std::fmt::Display) -> Self {
        RecordError::Store(msg.to_string())
    }
}
