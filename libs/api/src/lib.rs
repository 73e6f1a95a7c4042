pub mod error;
pub mod record;
pub mod traits;

pub use error::RecordError;
pub use record::{ChangeEvent, ChangeKind, Record};
pub use traits::{BoxFuture, EventPublisher, EventStream, RecordStore};
