use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Failed to (de)serialize stored value: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to deliver message: {0}")]
    Messaging(String),
    #[error("DOM operation failed: {0}")]
    Dom(String),
}
