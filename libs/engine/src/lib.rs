pub mod registry;
pub mod service;

pub use registry::{ConnectionRegistry, NotificationBus, Subscription};
pub use service::RecordService;
