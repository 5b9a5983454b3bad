use thiserror::Error;
use umc_measure::ValidationError;

/// Errors raised while polling a target service for metrics.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response status: {0}")]
    UnexpectedStatus(reqwest::StatusCode),

    #[error("response field missing or malformed: {0}")]
    MalformedResponse(String),

    #[error("collected measurement was invalid: {0}")]
    Validation(#[from] ValidationError),
}
