use origin_source::IdentityError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),
    /// Every metric source failed; there is nothing to report.
    #[error("Progress sources unreachable: {0}")]
    Unreachable(String),
}
