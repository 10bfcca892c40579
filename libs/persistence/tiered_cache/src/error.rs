/// Failure of a single cache tier.
///
/// Tier failures never reach callers of the orchestrator; they are logged
/// and the lookup falls through to the next tier or the origin.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Corrupt entry for key {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;
