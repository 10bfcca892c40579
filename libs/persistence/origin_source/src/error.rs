use thiserror::Error;

#[derive(Debug, Error)]
pub enum OriginError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),
    #[error("Connection error: {0}")]
    Connection(#[from] deadpool_postgres::PoolError),
    #[error("Origin unavailable for {table}: {reason}")]
    Unavailable { table: String, reason: String },
    #[error("Origin rejected request on {table}: {reason}")]
    Rejected { table: String, reason: String },
    #[error("Failed to decode row from {table}: {reason}")]
    Decode { table: String, reason: String },
    #[error("Unsupported query: {0}")]
    Unsupported(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl OriginError {
    /// Whether a retry has a chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            // No SQLSTATE means the failure happened below the protocol
            // (socket closed, timeout) rather than in the server.
            Self::Database(e) => e.code().is_none() || e.is_closed(),
            Self::Connection(_) | Self::Unavailable { .. } => true,
            Self::Rejected { .. }
            | Self::Decode { .. }
            | Self::Unsupported(_)
            | Self::Config(_) => false,
        }
    }

    pub fn decode(table: &str, reason: impl ToString) -> Self {
        Self::Decode {
            table: table.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type OriginResult<T> = Result<T, OriginError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        let unavailable = OriginError::Unavailable {
            table: "lessons".into(),
            reason: "timeout".into(),
        };
        let rejected = OriginError::Rejected {
            table: "lessons".into(),
            reason: "permission denied".into(),
        };

        assert!(unavailable.is_transient());
        assert!(!rejected.is_transient());
        assert!(!OriginError::decode("lessons", "bad uuid").is_transient());
    }
}
