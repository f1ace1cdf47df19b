pub mod http;
pub mod mock;

use thiserror::Error;

use crate::domain::email::{EmailRecord, HealthStatus};

/// Ways a call to the classification backend can fail.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("could not reach backend: {0}")]
    Network(#[from] reqwest::Error),

    #[error("backend answered with HTTP {0}")]
    Status(u16),

    #[error("unexpected response body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("bad endpoint url: {0}")]
    Url(#[from] url::ParseError),
}

/// The three endpoints the dashboard consumes.
pub trait ClassifierApi: Send + Sync {
    /// Never fails; every problem reads as "offline".
    fn check_health(&self) -> HealthStatus;
    fn classify_emails(&self) -> Result<Vec<EmailRecord>, ApiError>;
    fn recheck_emails(&self) -> Result<EmailRecord, ApiError>;
}
