use thiserror::Error;

/// Failure of a single outbound inference call. Never retried; always
/// surfaced to the caller unchanged.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("inference API returned status {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed inference response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing or unusable process configuration (e.g. no API key).
    /// Fatal at construction time.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Rejected input, checked before any stage executes.
    #[error("{0}")]
    Validation(String),

    /// An inference call failed; the run is aborted at the failing stage.
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// The completed report could not be written to disk.
    #[error("failed to persist report: {0}")]
    Persistence(#[from] std::io::Error),
}
