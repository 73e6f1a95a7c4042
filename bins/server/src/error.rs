#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("store: {0}")]
    Store(#[from] recsync_api::RecordError),

    #[error("signal: {0}")]
    Signal(#[from] std::io::Error),
}
