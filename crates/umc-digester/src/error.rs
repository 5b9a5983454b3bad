use thiserror::Error;

/// Errors raised while writing measurements to the time-series backend.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("write request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with something other than 204 No Content.
    #[error("backend rejected write: {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}
